use std::io;

use atoi::atoi;

use crate::connection::Connection;
use crate::db::{join_genres, split_genres, Catalog, CatalogError, Movie};

/// One variant per operation code on the wire.
#[derive(Debug)]
pub enum Command {
    Register(Register),
    AddGenre(AddGenre),
    Remove(Remove),
    ListTitles(ListTitles),
    ListAll(ListAll),
    Show(Show),
    ByGenre(ByGenre),
    Invalid(Invalid),
}

impl Command {
    /// Reads the next command from the connection: the operation code
    /// field, then the fields the code calls for. Returns `None` when the
    /// peer disconnected before a request or asked to terminate (code 0).
    /// An unparsable code coerces to 0, which also terminates.
    pub async fn read_from(conn: &mut Connection) -> Result<Option<Command>, crate::Error> {
        let code = match conn.read_field().await? {
            Some(field) => parse_u32(&field),
            None => return Ok(None),
        };

        let command = match code {
            0 => return Ok(None),
            1 => Command::Register(Register::read_fields(conn).await?),
            2 => Command::AddGenre(AddGenre::read_fields(conn).await?),
            3 => Command::Remove(Remove::read_fields(conn).await?),
            4 => Command::ListTitles(ListTitles),
            5 => Command::ListAll(ListAll),
            6 => Command::Show(Show::read_fields(conn).await?),
            7 => Command::ByGenre(ByGenre::read_fields(conn).await?),
            // Unknown codes consume no further fields.
            _ => Command::Invalid(Invalid),
        };

        Ok(Some(command))
    }

    /// Runs the command against the catalog and writes the response block.
    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        use Command::*;

        match self {
            Register(cmd) => cmd.apply(conn, catalog).await,
            AddGenre(cmd) => cmd.apply(conn, catalog).await,
            Remove(cmd) => cmd.apply(conn, catalog).await,
            ListTitles(cmd) => cmd.apply(conn, catalog).await,
            ListAll(cmd) => cmd.apply(conn, catalog).await,
            Show(cmd) => cmd.apply(conn, catalog).await,
            ByGenre(cmd) => cmd.apply(conn, catalog).await,
            Invalid(cmd) => cmd.apply(conn).await,
        }
    }
}

/// (1) Register a new movie.
#[derive(Debug)]
pub struct Register {
    pub title: String,
    pub director: String,
    pub year: i32,
    pub genres: Vec<String>,
}

/// (2) Add a genre to an existing movie.
#[derive(Debug)]
pub struct AddGenre {
    pub id: u32,
    pub genre: String,
}

/// (3) Remove a movie by id.
#[derive(Debug)]
pub struct Remove {
    pub id: u32,
}

/// (4) List all ids and titles.
#[derive(Debug, Default)]
pub struct ListTitles;

/// (5) List every field of every movie.
#[derive(Debug, Default)]
pub struct ListAll;

/// (6) Show every field of one movie.
#[derive(Debug)]
pub struct Show {
    pub id: u32,
}

/// (7) List every movie matching a genre.
#[derive(Debug)]
pub struct ByGenre {
    pub genre: String,
}

/// Any unrecognized operation code.
#[derive(Debug, Default)]
pub struct Invalid;

impl Register {
    pub fn new(title: &str, director: &str, year: i32, genres: Vec<String>) -> Register {
        Register {
            title: title.to_string(),
            director: director.to_string(),
            year,
            genres,
        }
    }

    pub(crate) async fn read_fields(conn: &mut Connection) -> Result<Register, crate::Error> {
        let title = required_field(conn).await?;
        let director = required_field(conn).await?;
        let year = parse_year(&required_field(conn).await?);
        let genres = split_genres(&required_field(conn).await?);

        Ok(Register {
            title,
            director,
            year,
            genres,
        })
    }

    pub(crate) async fn write_to(&self, conn: &mut Connection) -> io::Result<()> {
        conn.write_field("1").await?;
        conn.write_field(&self.title).await?;
        conn.write_field(&self.director).await?;
        conn.write_field(&self.year.to_string()).await?;
        conn.write_field(&join_genres(&self.genres)).await
    }

    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        let response = match catalog.register(&self.title, &self.director, self.year, self.genres) {
            Ok(id) => format!("Movie registered successfully! ID: {}", id),
            Err(err) => format!("Error: {}!", err),
        };

        conn.write_block(&response).await?;

        Ok(())
    }
}

impl AddGenre {
    pub fn new(id: u32, genre: &str) -> AddGenre {
        AddGenre {
            id,
            genre: genre.to_string(),
        }
    }

    pub(crate) async fn read_fields(conn: &mut Connection) -> Result<AddGenre, crate::Error> {
        let id = parse_u32(&required_field(conn).await?);
        let genre = required_field(conn).await?;

        Ok(AddGenre { id, genre })
    }

    pub(crate) async fn write_to(&self, conn: &mut Connection) -> io::Result<()> {
        conn.write_field("2").await?;
        conn.write_field(&self.id.to_string()).await?;
        conn.write_field(&self.genre).await
    }

    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        let response = match catalog.add_genre(self.id, &self.genre) {
            Ok(()) => format!("Genre '{}' added to movie ID {}.", self.genre, self.id),
            Err(err) => format!("Error: {}.", err),
        };

        conn.write_block(&response).await?;

        Ok(())
    }
}

impl Remove {
    pub fn new(id: u32) -> Remove {
        Remove { id }
    }

    pub(crate) async fn read_fields(conn: &mut Connection) -> Result<Remove, crate::Error> {
        let id = parse_u32(&required_field(conn).await?);

        Ok(Remove { id })
    }

    pub(crate) async fn write_to(&self, conn: &mut Connection) -> io::Result<()> {
        conn.write_field("3").await?;
        conn.write_field(&self.id.to_string()).await
    }

    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        let response = match catalog.remove(self.id) {
            Ok(()) => format!("Movie with ID {} removed successfully.", self.id),
            Err(err) => format!("Error: {}.", err),
        };

        conn.write_block(&response).await?;

        Ok(())
    }
}

impl ListTitles {
    pub(crate) async fn write_to(&self, conn: &mut Connection) -> io::Result<()> {
        conn.write_field("4").await
    }

    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        let titles = catalog.list_titles();

        let response = if titles.is_empty() {
            "No movies registered.".to_string()
        } else {
            let mut lines = vec!["Movies (ID - Title):".to_string()];
            lines.extend(titles.iter().map(|(id, title)| format!("{} - {}", id, title)));
            lines.join("\n")
        };

        conn.write_block(&response).await?;

        Ok(())
    }
}

impl ListAll {
    pub(crate) async fn write_to(&self, conn: &mut Connection) -> io::Result<()> {
        conn.write_field("5").await
    }

    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        let movies = catalog.list_all();

        let response = if movies.is_empty() {
            "No movies registered.".to_string()
        } else {
            let mut lines = vec!["All registered movies:".to_string()];
            lines.extend(movies.iter().map(summary_line));
            lines.join("\n")
        };

        conn.write_block(&response).await?;

        Ok(())
    }
}

impl Show {
    pub fn new(id: u32) -> Show {
        Show { id }
    }

    pub(crate) async fn read_fields(conn: &mut Connection) -> Result<Show, crate::Error> {
        let id = parse_u32(&required_field(conn).await?);

        Ok(Show { id })
    }

    pub(crate) async fn write_to(&self, conn: &mut Connection) -> io::Result<()> {
        conn.write_field("6").await?;
        conn.write_field(&self.id.to_string()).await
    }

    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        let response = match catalog.get(self.id) {
            Some(movie) => format!(
                "Movie details (ID {}):\nTitle: {}\nDirector: {}\nYear: {}\nGenres: {}",
                movie.id,
                movie.title,
                movie.director,
                movie.year,
                movie.joined_genres(),
            ),
            None => format!("Error: {}.", CatalogError::NotFound(self.id)),
        };

        conn.write_block(&response).await?;

        Ok(())
    }
}

impl ByGenre {
    pub fn new(genre: &str) -> ByGenre {
        ByGenre {
            genre: genre.to_string(),
        }
    }

    pub(crate) async fn read_fields(conn: &mut Connection) -> Result<ByGenre, crate::Error> {
        let genre = required_field(conn).await?;

        Ok(ByGenre { genre })
    }

    pub(crate) async fn write_to(&self, conn: &mut Connection) -> io::Result<()> {
        conn.write_field("7").await?;
        conn.write_field(&self.genre).await
    }

    pub(crate) async fn apply(self, conn: &mut Connection, catalog: &Catalog) -> Result<(), crate::Error> {
        let movies = catalog.list_by_genre(&self.genre);

        let response = if movies.is_empty() {
            "No movies found for this genre.".to_string()
        } else {
            let mut lines = vec![format!("Movies matching genre '{}':", self.genre)];
            lines.extend(movies.iter().map(summary_line));
            lines.join("\n")
        };

        conn.write_block(&response).await?;

        Ok(())
    }
}

impl Invalid {
    pub(crate) async fn apply(self, conn: &mut Connection) -> Result<(), crate::Error> {
        conn.write_block("Invalid option.").await?;

        Ok(())
    }
}

fn summary_line(movie: &Movie) -> String {
    format!(
        "ID: {} | Title: {} | Director: {} | Year: {} | Genres: {}",
        movie.id,
        movie.title,
        movie.director,
        movie.year,
        movie.joined_genres(),
    )
}

/// A field the operation cannot proceed without; the peer closing here is a
/// fault, not a graceful end of the session.
async fn required_field(conn: &mut Connection) -> Result<String, crate::Error> {
    match conn.read_field().await? {
        Some(field) => Ok(field),
        None => Err("connection closed mid-request".into()),
    }
}

/// C-style tolerant parse: leading digits count, anything else is 0.
fn parse_u32(field: &str) -> u32 {
    atoi(field.trim().as_bytes()).unwrap_or(0)
}

fn parse_year(field: &str) -> i32 {
    atoi(field.trim().as_bytes()).unwrap_or(0)
}
