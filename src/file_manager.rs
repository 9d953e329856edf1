use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::db::{split_genres, Movie};

/// Record fields are joined with this in the catalog file. Values that
/// contain it corrupt the format on reload; the flat format does no
/// escaping, a known limitation.
pub const FIELD_DELIMITER: char = ',';

/// Loads the catalog file at `path`: one record per line in the form
/// `id,title,director,year,genres`. A missing file is an empty catalog.
/// Lines with fewer than five fields are skipped, numeric fields that fail
/// to parse coerce to 0.
pub fn load(path: &Path) -> io::Result<Vec<Movie>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut movies = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line?;

        if let Some(movie) = parse_line(&line) {
            movies.push(movie);
        }
    }

    Ok(movies)
}

/// Rewrites the catalog file from scratch, one line per record in catalog
/// order. The content goes to a temp file in the same directory first and
/// is renamed over `path`, so a reader never observes a half-written
/// catalog. Callers serialize saves through the catalog lock.
pub fn save(path: &Path, movies: &[Movie]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;

    for movie in movies {
        writeln!(file, "{}", serialize_line(movie))?;
    }

    file.persist(path)?;

    Ok(())
}

fn serialize_line(movie: &Movie) -> String {
    [
        movie.id.to_string(),
        movie.title.clone(),
        movie.director.clone(),
        movie.year.to_string(),
        movie.joined_genres(),
    ]
    .join(&FIELD_DELIMITER.to_string())
}

fn parse_line(line: &str) -> Option<Movie> {
    let mut fields = line.splitn(5, FIELD_DELIMITER);

    let id = fields.next()?;
    let title = fields.next()?;
    let director = fields.next()?;
    let year = fields.next()?;
    let genres = fields.next()?;

    Some(Movie {
        id: atoi::atoi(id.trim().as_bytes()).unwrap_or(0),
        title: title.to_string(),
        director: director.to_string(),
        year: atoi::atoi(year.trim().as_bytes()).unwrap_or(0),
        genres: split_genres(genres),
    })
}
