//! Substring filters for the post listing.
//!
//! Query parameters compile into a [`PostFilter`]: a list of clauses, each
//! requiring one field to contain a piece of text. Clauses combine with AND.
//! The filter knows nothing about SQL; stores either evaluate
//! [`PostFilter::matches`] themselves or render [`PostFilter::clauses`] into
//! their own query language.

use crate::post::Post;

/// A filterable post field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    Title,
    Body,
}

impl Field {
    /// Column name in the relational schema.
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body  => "body",
        }
    }

    fn value(self, post: &Post) -> &str {
        match self {
            Self::Title => &post.title,
            Self::Body  => &post.body,
        }
    }
}

/// `field` must contain `needle`. Case-sensitive, unanchored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Clause {
    pub field: Field,
    pub needle: String,
}

impl Clause {
    pub fn matches(&self, post: &Post) -> bool {
        self.field.value(post).contains(self.needle.as_str())
    }
}

/// Recognised query parameters and the field each one filters.
const PARAMS: [(&str, Field); 2] = [("title_like", Field::Title), ("body_like", Field::Body)];

/// Conjunction of substring clauses. The empty filter matches every post.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PostFilter {
    clauses: Vec<Clause>,
}

impl PostFilter {
    /// Builds a filter from query parameters.
    ///
    /// `title_like` and `body_like` are recognised; anything else is ignored.
    /// A parameter that is absent or empty adds no clause. When a parameter
    /// repeats, the first occurrence wins.
    pub fn from_query<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
        let clauses = PARAMS
            .iter()
            .filter_map(|&(param, field)| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == param)
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(_, v)| Clause { field, needle: (*v).to_owned() })
            })
            .collect();
        Self { clauses }
    }

    /// Adds a clause. Returns `self` for chaining.
    pub fn contains(mut self, field: Field, needle: impl Into<String>) -> Self {
        self.clauses.push(Clause { field, needle: needle.into() });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True if `post` satisfies every clause.
    pub fn matches(&self, post: &Post) -> bool {
        self.clauses.iter().all(|c| c.matches(post))
    }

    /// Keeps matching posts, ordered by ascending id.
    pub fn apply<I>(&self, posts: I) -> Vec<Post>
    where
        I: IntoIterator<Item = Post>,
    {
        let mut out: Vec<Post> = posts.into_iter().filter(|p| self.matches(p)).collect();
        out.sort_by_key(|p| p.id);
        out
    }
}
