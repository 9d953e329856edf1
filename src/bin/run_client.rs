use std::io::{self, Write};

use clap::Parser;

use movie_db::client::Client;
use movie_db::Error;

/// Interactive client for the movie catalog server.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Server host to connect to.
    host: String,

    /// Server TCP port.
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli_args = CliArgs::parse();

    let mut client = Client::connect((cli_args.host.as_str(), cli_args.port)).await?;
    println!("Connected to server {}:{}", cli_args.host, cli_args.port);

    loop {
        print_menu();
        let choice = prompt("Choose an option: ")?;
        let choice = choice.trim();

        let response = match choice {
            "0" => {
                println!("Closing connection...");
                client.quit().await?;
                return Ok(());
            }
            "1" => {
                let title = prompt("Movie title: ")?;
                let director = prompt("Director name: ")?;
                let year = prompt("Release year (YYYY): ")?;
                let genres = prompt("Genres (separated by ';', no spaces): ")?;

                let year = year.trim().parse().unwrap_or(0);
                let genres = genres
                    .split(';')
                    .filter(|genre| !genre.is_empty())
                    .map(str::to_string)
                    .collect();

                client.register(title.trim(), director.trim(), year, genres).await?
            }
            "2" => {
                let id = prompt_id("Movie ID: ")?;
                let genre = prompt("New genre to add: ")?;

                client.add_genre(id, genre.trim()).await?
            }
            "3" => {
                let id = prompt_id("ID of the movie to remove: ")?;

                client.remove(id).await?
            }
            "4" => client.list_titles().await?,
            "5" => client.list_all().await?,
            "6" => {
                let id = prompt_id("Movie ID: ")?;

                client.show(id).await?
            }
            "7" => {
                let genre = prompt("Genre: ")?;

                client.by_genre(genre.trim()).await?
            }
            // Let the server answer unknown options itself. Inputs that
            // coerce to 0 server-side close the session instead.
            other => match client.send_code(other).await {
                Ok(response) => response,
                Err(_) => {
                    println!("Connection closed by server.");
                    return Ok(());
                }
            },
        };

        println!("\n--- Server response ---\n{}", response);
    }
}

fn print_menu() {
    println!();
    println!("==============================================");
    println!("            MOVIE CATALOG MENU");
    println!("==============================================");
    println!("1. Register a new movie");
    println!("2. Add a new genre to a movie");
    println!("3. Remove a movie by its identifier");
    println!("4. List all movie titles with their identifiers");
    println!("5. List details of all movies");
    println!("6. List details of a specific movie");
    println!("7. List all movies of a given genre");
    println!("0. Close connection");
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt_id(label: &str) -> io::Result<u32> {
    let raw = prompt(label)?;

    Ok(raw.trim().parse().unwrap_or(0))
}
