use tokio::net::{TcpStream, ToSocketAddrs};

use crate::cmd::{AddGenre, ByGenre, ListAll, ListTitles, Register, Remove, Show};
use crate::connection::Connection;

/// Thin client over the text protocol: one method per operation, each
/// returning the server's response text verbatim.
pub struct Client {
    connection: Connection,
}

impl Client {
    pub async fn connect<T: ToSocketAddrs>(addr: T) -> Result<Client, crate::Error> {
        let socket = TcpStream::connect(addr).await?;
        let connection = Connection::new(socket);

        Ok(Client { connection })
    }

    pub async fn register(
        &mut self,
        title: &str,
        director: &str,
        year: i32,
        genres: Vec<String>,
    ) -> Result<String, crate::Error> {
        let cmd = Register::new(title, director, year, genres);
        cmd.write_to(&mut self.connection).await?;

        self.read_response().await
    }

    pub async fn add_genre(&mut self, id: u32, genre: &str) -> Result<String, crate::Error> {
        AddGenre::new(id, genre).write_to(&mut self.connection).await?;

        self.read_response().await
    }

    pub async fn remove(&mut self, id: u32) -> Result<String, crate::Error> {
        Remove::new(id).write_to(&mut self.connection).await?;

        self.read_response().await
    }

    pub async fn list_titles(&mut self) -> Result<String, crate::Error> {
        ListTitles.write_to(&mut self.connection).await?;

        self.read_response().await
    }

    pub async fn list_all(&mut self) -> Result<String, crate::Error> {
        ListAll.write_to(&mut self.connection).await?;

        self.read_response().await
    }

    pub async fn show(&mut self, id: u32) -> Result<String, crate::Error> {
        Show::new(id).write_to(&mut self.connection).await?;

        self.read_response().await
    }

    pub async fn by_genre(&mut self, genre: &str) -> Result<String, crate::Error> {
        ByGenre::new(genre).write_to(&mut self.connection).await?;

        self.read_response().await
    }

    /// Sends a bare operation code and reads the response, whatever it is.
    /// The interactive client routes unrecognized menu choices through this
    /// so the server gets to answer "Invalid option." itself.
    pub async fn send_code(&mut self, code: &str) -> Result<String, crate::Error> {
        self.connection.write_field(code).await?;

        self.read_response().await
    }

    /// Asks the server to terminate the session (code 0). No response is
    /// sent for this.
    pub async fn quit(mut self) -> Result<(), crate::Error> {
        self.connection.write_field("0").await?;

        Ok(())
    }

    async fn read_response(&mut self) -> Result<String, crate::Error> {
        match self.connection.read_block().await? {
            Some(text) => Ok(text),
            None => Err("connection closed by server".into()),
        }
    }
}
