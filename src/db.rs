use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::error;

use crate::file_manager;

/// Hard limit on catalog size; registering past it fails instead of
/// evicting.
pub const MAX_MOVIES: usize = 1000;

/// Genre tokens are joined with this on the wire and on disk.
pub const GENRE_DELIMITER: char = ';';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: u32,
    pub title: String,
    pub director: String,
    pub year: i32,
    pub genres: Vec<String>,
}

impl Movie {
    pub fn joined_genres(&self) -> String {
        join_genres(&self.genres)
    }
}

pub fn join_genres(genres: &[String]) -> String {
    genres.join(&GENRE_DELIMITER.to_string())
}

/// Splits a raw genre field into tokens, preserving duplicates and order.
/// An empty field means no genres, not one empty genre.
pub fn split_genres(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    raw.split(GENRE_DELIMITER).map(str::to_string).collect()
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("movie with ID {0} not found")]
    NotFound(u32),

    #[error("movie limit reached")]
    CapacityExceeded,
}

/// Handle to the shared catalog. Cloning is cheap; all clones point at the
/// same record set behind a single mutex, and every operation holds that
/// mutex for its full duration, including the persistence write after a
/// mutation.
#[derive(Debug, Clone)]
pub struct Catalog {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    store: Mutex<Store>,
    path: PathBuf,
}

#[derive(Debug)]
struct Store {
    movies: Vec<Movie>,
    capacity: usize,
}

impl Catalog {
    /// Loads the catalog persisted at `path`. A missing file is an empty
    /// catalog, not an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Catalog, crate::Error> {
        Catalog::load_bounded(path, MAX_MOVIES)
    }

    /// Same as [`Catalog::load`] with an explicit capacity bound.
    pub fn load_bounded(path: impl Into<PathBuf>, capacity: usize) -> Result<Catalog, crate::Error> {
        let path = path.into();
        let movies = file_manager::load(&path)?;

        Ok(Catalog {
            shared: Arc::new(Shared {
                store: Mutex::new(Store { movies, capacity }),
                path,
            }),
        })
    }

    /// Registers a new movie and returns its assigned id: one more than the
    /// largest live id, or 1 for an empty catalog. Freed ids are not
    /// reclaimed unless the freed id was the maximum.
    pub fn register(
        &self,
        title: &str,
        director: &str,
        year: i32,
        genres: Vec<String>,
    ) -> Result<u32, CatalogError> {
        let mut store = self.lock();

        if store.movies.len() >= store.capacity {
            return Err(CatalogError::CapacityExceeded);
        }

        let id = store.next_id();

        store.movies.push(Movie {
            id,
            title: title.to_string(),
            director: director.to_string(),
            year,
            genres,
        });

        self.save(&store);

        Ok(id)
    }

    /// Appends a genre to a movie's genre list. Existing genres are kept;
    /// the join delimiter only appears once there are two or more tokens.
    pub fn add_genre(&self, id: u32, genre: &str) -> Result<(), CatalogError> {
        let mut store = self.lock();

        let movie = store
            .movies
            .iter_mut()
            .find(|movie| movie.id == id)
            .ok_or(CatalogError::NotFound(id))?;

        movie.genres.push(genre.to_string());

        self.save(&store);

        Ok(())
    }

    /// Removes a movie in O(1): the last record takes the vacated slot, so
    /// iteration order is not preserved across removals.
    pub fn remove(&self, id: u32) -> Result<(), CatalogError> {
        let mut store = self.lock();

        let index = store
            .movies
            .iter()
            .position(|movie| movie.id == id)
            .ok_or(CatalogError::NotFound(id))?;

        store.movies.swap_remove(index);

        self.save(&store);

        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<Movie> {
        self.lock().movies.iter().find(|movie| movie.id == id).cloned()
    }

    /// Snapshot of (id, title) pairs in current iteration order.
    pub fn list_titles(&self) -> Vec<(u32, String)> {
        self.lock()
            .movies
            .iter()
            .map(|movie| (movie.id, movie.title.clone()))
            .collect()
    }

    /// Snapshot of all records in current iteration order.
    pub fn list_all(&self) -> Vec<Movie> {
        self.lock().movies.clone()
    }

    /// All movies whose joined genre string contains `genre` as a literal
    /// substring. "Action" matches a movie tagged "Action-Comedy"; this is
    /// containment, not token equality.
    pub fn list_by_genre(&self, genre: &str) -> Vec<Movie> {
        self.lock()
            .movies
            .iter()
            .filter(|movie| movie.joined_genres().contains(genre))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.shared.store.lock().unwrap()
    }

    /// Persists the full catalog. Called with the lock held, so saves never
    /// interleave. A failure leaves the in-memory mutation in place and is
    /// only logged; durability is best-effort.
    fn save(&self, store: &Store) {
        if let Err(err) = file_manager::save(&self.shared.path, &store.movies) {
            error!("failed to persist catalog to {:?}: {}", self.shared.path, err);
        }
    }
}

impl Store {
    fn next_id(&self) -> u32 {
        self.movies.iter().map(|movie| movie.id).max().unwrap_or(0) + 1
    }
}
