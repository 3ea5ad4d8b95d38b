use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub director: String,
    pub duration: u32,
    pub poster: String,
    pub genre: Vec<Genre>,
    pub rating: f64,
}

/// A validated creation payload. The id is assigned by the store.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub director: String,
    pub duration: u32,
    pub poster: String,
    pub genre: Vec<Genre>,
    pub rating: f64,
}

/// A validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub director: Option<String>,
    pub duration: Option<u32>,
    pub poster: Option<String>,
    pub genre: Option<Vec<Genre>>,
    pub rating: Option<f64>,
}

impl Movie {
    pub fn from_new(id: String, new: NewMovie) -> Self {
        Self {
            id,
            title: new.title,
            year: new.year,
            director: new.director,
            duration: new.duration,
            poster: new.poster,
            genre: new.genre,
            rating: new.rating,
        }
    }

    /// Shallow merge: every field present in the patch replaces the stored one.
    pub fn apply(&mut self, patch: MoviePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(director) = patch.director {
            self.director = director;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(poster) = patch.poster {
            self.poster = poster;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
    }

    pub fn has_genre(&self, query: &str) -> bool {
        self.genre
            .iter()
            .any(|g| g.as_str().eq_ignore_ascii_case(query))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Biography,
    Comedy,
    Crime,
    Drama,
    Fantasy,
    Horror,
    Romance,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Thriller,
}

impl Genre {
    pub const ALL: [Genre; 12] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Biography,
        Genre::Comedy,
        Genre::Crime,
        Genre::Drama,
        Genre::Fantasy,
        Genre::Horror,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Biography => "Biography",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Exact, case-sensitive: write payloads must use the canonical spelling.
impl FromStr for Genre {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        Genre::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown genre '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Movie {
        Movie {
            id: "m-1".to_string(),
            title: "The Matrix".to_string(),
            year: 1999,
            director: "Lana Wachowski".to_string(),
            duration: 136,
            poster: "https://example.com/matrix.jpg".to_string(),
            genre: vec![Genre::Action, Genre::SciFi],
            rating: 8.7,
        }
    }

    #[test]
    fn genre_parsing_is_case_sensitive() {
        assert_eq!("Sci-Fi".parse::<Genre>().ok(), Some(Genre::SciFi));
        assert_eq!("Drama".parse::<Genre>().ok(), Some(Genre::Drama));
        assert!("drama".parse::<Genre>().is_err());
        assert!("Western".parse::<Genre>().is_err());
    }

    #[test]
    fn genre_serializes_with_canonical_name() {
        let json = serde_json::to_string(&vec![Genre::SciFi, Genre::Crime]).unwrap();
        assert_eq!(json, r#"["Sci-Fi","Crime"]"#);
    }

    #[test]
    fn has_genre_ignores_case() {
        let movie = sample();
        assert!(movie.has_genre("sci-fi"));
        assert!(movie.has_genre("ACTION"));
        assert!(!movie.has_genre("Drama"));
        assert!(!movie.has_genre("Sci"));
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut movie = sample();
        movie.apply(MoviePatch {
            rating: Some(9.0),
            ..MoviePatch::default()
        });
        let expected = Movie {
            rating: 9.0,
            ..sample()
        };
        assert_eq!(movie, expected);
    }
}
