use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Movie, MoviePatch, NewMovie};

const BUNDLED_MOVIES: &str = include_str!("../data/movies.json");

/// Storage seam used by the HTTP layer. `None` means the id is unknown.
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn list(&self, genre: Option<&str>) -> Result<Vec<Movie>>;
    async fn get(&self, id: &str) -> Result<Option<Movie>>;
    async fn create(&self, movie: NewMovie) -> Result<Movie>;
    async fn update(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>>;
    async fn delete(&self, id: &str) -> Result<Option<Movie>>;
}

/// Ordered collection with a single owner; lookups are linear scans.
#[derive(Debug, Default, Clone)]
pub struct MovieStore {
    movies: Vec<Movie>,
}

impl MovieStore {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn all(&self) -> &[Movie] {
        &self.movies
    }

    pub fn by_genre(&self, genre: &str) -> Vec<Movie> {
        self.movies
            .iter()
            .filter(|m| m.has_genre(genre))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }

    pub fn append(&mut self, new: NewMovie) -> Movie {
        let mut id = Uuid::new_v4().to_string();
        while self.find(&id).is_some() {
            id = Uuid::new_v4().to_string();
        }
        let movie = Movie::from_new(id, new);
        self.movies.push(movie.clone());
        movie
    }

    pub fn merge(&mut self, id: &str, patch: MoviePatch) -> Option<Movie> {
        let movie = self.movies.iter_mut().find(|m| m.id == id)?;
        movie.apply(patch);
        Some(movie.clone())
    }

    pub fn remove(&mut self, id: &str) -> Option<Movie> {
        let idx = self.movies.iter().position(|m| m.id == id)?;
        Some(self.movies.remove(idx))
    }
}

pub struct InMemoryMovies {
    store: Mutex<MovieStore>,
}

impl InMemoryMovies {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self {
            store: Mutex::new(MovieStore::new(movies)),
        }
    }
}

#[async_trait]
impl MovieRepository for InMemoryMovies {
    async fn list(&self, genre: Option<&str>) -> Result<Vec<Movie>> {
        let store = self.store.lock().await;
        Ok(match genre {
            Some(g) => store.by_genre(g),
            None => store.all().to_vec(),
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Movie>> {
        Ok(self.store.lock().await.find(id).cloned())
    }

    async fn create(&self, movie: NewMovie) -> Result<Movie> {
        let created = self.store.lock().await.append(movie);
        debug!(id = %created.id, "Appended movie");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>> {
        Ok(self.store.lock().await.merge(id, patch))
    }

    async fn delete(&self, id: &str) -> Result<Option<Movie>> {
        Ok(self.store.lock().await.remove(id))
    }
}

/// Reads the seed collection from `path`, or the bundled data when unset.
pub async fn load_movies(path: Option<&Path>) -> Result<Vec<Movie>> {
    let movies = match path {
        Some(p) => {
            let raw = tokio::fs::read_to_string(p)
                .await
                .with_context(|| format!("Failed to read movies file {}", p.display()))?;
            parse_movies(&raw)
                .with_context(|| format!("Invalid movies file {}", p.display()))?
        }
        None => parse_movies(BUNDLED_MOVIES).context("Invalid bundled movies data")?,
    };
    info!("Loaded {} movies", movies.len());
    Ok(movies)
}

pub fn parse_movies(raw: &str) -> Result<Vec<Movie>> {
    let movies: Vec<Movie> = serde_json::from_str(raw).context("Failed to parse movies JSON")?;
    let mut seen = HashSet::new();
    for movie in &movies {
        if !seen.insert(movie.id.as_str()) {
            anyhow::bail!("Duplicate movie id: {}", movie.id);
        }
    }
    Ok(movies)
}
