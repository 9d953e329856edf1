//! End-to-end tests driving a real server task over TCP. Each test gets an
//! isolated catalog file in its own temp directory.

use std::future;
use std::path::PathBuf;

use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};

use movie_db::client::Client;
use movie_db::connection::Connection;
use movie_db::db::Catalog;
use movie_db::server;

struct TestServer {
    addr: String,
    catalog_path: PathBuf,
    _dir: TempDir,
}

impl TestServer {
    async fn spawn() -> TestServer {
        let dir = TempDir::new().unwrap();
        let catalog_path = dir.path().join("movies.csv");
        let catalog = Catalog::load(&catalog_path).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            server::run(listener, catalog, future::pending::<()>()).await;
        });

        TestServer {
            addr,
            catalog_path,
            _dir: dir,
        }
    }

    async fn client(&self) -> Client {
        Client::connect(&self.addr).await.unwrap()
    }
}

#[tokio::test]
async fn register_show_remove_scenario() {
    let server = TestServer::spawn().await;
    let mut client = server.client().await;

    let response = client
        .register("Inception", "Nolan", 2010, vec!["SciFi".into(), "Thriller".into()])
        .await
        .unwrap();
    assert_eq!(response, "Movie registered successfully! ID: 1");

    let response = client.show(1).await.unwrap();
    assert_eq!(
        response,
        "Movie details (ID 1):\nTitle: Inception\nDirector: Nolan\nYear: 2010\nGenres: SciFi;Thriller"
    );

    let response = client.remove(1).await.unwrap();
    assert_eq!(response, "Movie with ID 1 removed successfully.");

    let response = client.show(1).await.unwrap();
    assert_eq!(response, "Error: movie with ID 1 not found.");
}

#[tokio::test]
async fn listings_on_an_empty_catalog() {
    let server = TestServer::spawn().await;
    let mut client = server.client().await;

    assert_eq!(client.list_titles().await.unwrap(), "No movies registered.");
    assert_eq!(client.list_all().await.unwrap(), "No movies registered.");
    assert_eq!(
        client.by_genre("Drama").await.unwrap(),
        "No movies found for this genre."
    );
}

#[tokio::test]
async fn listings_and_genre_filtering() {
    let server = TestServer::spawn().await;
    let mut client = server.client().await;

    client
        .register("Airplane!", "Abrahams", 1980, vec!["Comedy".into(), "Drama".into()])
        .await
        .unwrap();
    client
        .register("Annie Hall", "Allen", 1977, vec!["Romantic-Comedy".into()])
        .await
        .unwrap();
    client
        .register("Alien", "Scott", 1979, vec!["Horror".into()])
        .await
        .unwrap();

    assert_eq!(
        client.list_titles().await.unwrap(),
        "Movies (ID - Title):\n1 - Airplane!\n2 - Annie Hall\n3 - Alien"
    );

    // Substring containment, not exact token match.
    assert_eq!(
        client.by_genre("Com").await.unwrap(),
        "Movies matching genre 'Com':\n\
         ID: 1 | Title: Airplane! | Director: Abrahams | Year: 1980 | Genres: Comedy;Drama\n\
         ID: 2 | Title: Annie Hall | Director: Allen | Year: 1977 | Genres: Romantic-Comedy"
    );
}

#[tokio::test]
async fn add_genre_round_trip() {
    let server = TestServer::spawn().await;
    let mut client = server.client().await;

    client.register("Heat", "Mann", 1995, vec!["Crime".into()]).await.unwrap();

    let response = client.add_genre(1, "Thriller").await.unwrap();
    assert_eq!(response, "Genre 'Thriller' added to movie ID 1.");

    let response = client.show(1).await.unwrap();
    assert!(response.contains("Genres: Crime;Thriller"));

    let response = client.add_genre(99, "Drama").await.unwrap();
    assert_eq!(response, "Error: movie with ID 99 not found.");
}

#[tokio::test]
async fn unknown_codes_get_an_invalid_option_response() {
    let server = TestServer::spawn().await;

    let socket = TcpStream::connect(&server.addr).await.unwrap();
    let mut connection = Connection::new(socket);

    connection.write_field("9").await.unwrap();
    assert_eq!(connection.read_block().await.unwrap().unwrap(), "Invalid option.");

    // Unknown codes consume no fields, so the next line is a fresh request.
    connection.write_field("4").await.unwrap();
    assert_eq!(connection.read_block().await.unwrap().unwrap(), "No movies registered.");
}

#[tokio::test]
async fn code_zero_terminates_the_connection_without_a_response() {
    let server = TestServer::spawn().await;

    let socket = TcpStream::connect(&server.addr).await.unwrap();
    let mut connection = Connection::new(socket);

    connection.write_field("0").await.unwrap();
    assert!(connection.read_block().await.unwrap().is_none());
}

#[tokio::test]
async fn unparsable_codes_terminate_like_code_zero() {
    let server = TestServer::spawn().await;

    let socket = TcpStream::connect(&server.addr).await.unwrap();
    let mut connection = Connection::new(socket);

    connection.write_field("quit").await.unwrap();
    assert!(connection.read_block().await.unwrap().is_none());
}

#[tokio::test]
async fn unparsable_year_coerces_to_zero() {
    let server = TestServer::spawn().await;
    let mut client = server.client().await;

    client
        .register("Undated", "Unknown", 0, vec!["Mystery".into()])
        .await
        .unwrap();

    let socket = TcpStream::connect(&server.addr).await.unwrap();
    let mut connection = Connection::new(socket);

    for field in ["1", "Also Undated", "Nobody", "not-a-year", "Mystery"] {
        connection.write_field(field).await.unwrap();
    }
    assert_eq!(
        connection.read_block().await.unwrap().unwrap(),
        "Movie registered successfully! ID: 2"
    );

    let mut client = server.client().await;
    let response = client.show(2).await.unwrap();
    assert!(response.contains("Year: 0"));
}

/// One client task per connection with no fan-out bound: N concurrent
/// registrations must yield exactly N records with N distinct sequential
/// ids, and the persisted file must hold exactly N lines.
#[tokio::test]
async fn concurrent_registrations_stay_consistent() {
    const CLIENTS: usize = 16;

    let server = TestServer::spawn().await;

    let mut handles = Vec::new();
    for i in 0..CLIENTS {
        let addr = server.addr.clone();

        handles.push(tokio::spawn(async move {
            let mut client = Client::connect(&addr).await.unwrap();
            let response = client
                .register(&format!("Movie {i}"), "Director", 2000, vec!["G".into()])
                .await
                .unwrap();
            client.quit().await.unwrap();
            response
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap();
        let id: u32 = response
            .rsplit(' ')
            .next()
            .unwrap()
            .parse()
            .expect("response should end with the new id");
        ids.push(id);
    }

    ids.sort_unstable();
    assert_eq!(ids, (1..=CLIENTS as u32).collect::<Vec<u32>>());

    let contents = std::fs::read_to_string(&server.catalog_path).unwrap();
    assert_eq!(contents.lines().count(), CLIENTS);
}

#[tokio::test]
async fn catalog_survives_a_server_restart() {
    let server = TestServer::spawn().await;
    let mut client = server.client().await;

    client
        .register("Stalker", "Tarkovsky", 1979, vec!["SciFi".into()])
        .await
        .unwrap();

    // A second server over the same file sees the persisted record.
    let catalog = Catalog::load(&server.catalog_path).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        server::run(listener, catalog, future::pending::<()>()).await;
    });

    let mut client = Client::connect(&addr).await.unwrap();
    let response = client.show(1).await.unwrap();
    assert!(response.contains("Title: Stalker"));
    assert!(response.contains("Year: 1979"));
}
