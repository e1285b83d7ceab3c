//! Author registry service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{author::CreateAuthor, Author, BookDetails},
};

use super::library::Library;

#[derive(Clone)]
pub struct AuthorsService {
    library: Arc<Library>,
}

impl AuthorsService {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    /// Register an author. Names are unique, compared case-insensitively.
    pub async fn create(&self, request: CreateAuthor) -> AppResult<Author> {
        request.validate()?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("author name must not be empty".to_string()));
        }

        let author = self
            .library
            .transact("create_author", |catalogue| {
                if catalogue
                    .authors()
                    .any(|a| a.name.eq_ignore_ascii_case(&name))
                {
                    return Err(AppError::Conflict(format!("Author '{}' already exists", name)));
                }
                let author = Author {
                    id: catalogue.next_author_id()?,
                    name: name.clone(),
                    bio: request.bio.filter(|bio| !bio.trim().is_empty()),
                };
                catalogue.insert_author(author.clone());
                Ok(author)
            })
            .await?;

        tracing::info!(author_id = author.id, name = %author.name, "Author created");
        Ok(author)
    }

    pub async fn get(&self, id: u32) -> AppResult<Author> {
        self.library.snapshot().await.author(id).cloned()
    }

    pub async fn list(&self) -> Vec<Author> {
        self.library.snapshot().await.authors().cloned().collect()
    }

    /// Books linked to an author
    pub async fn books(&self, id: u32) -> AppResult<Vec<BookDetails>> {
        let catalogue = self.library.snapshot().await;
        catalogue.author(id)?;
        Ok(catalogue
            .books()
            .filter(|b| b.author_id == Some(id))
            .map(BookDetails::from)
            .collect())
    }

    /// Remove an author that no book references
    pub async fn delete(&self, id: u32) -> AppResult<()> {
        self.library
            .transact("delete_author", |catalogue| {
                catalogue.author(id)?;
                let books = catalogue.books_by_author(id);
                if books > 0 {
                    return Err(AppError::AuthorHasBooks { author_id: id, books });
                }
                catalogue.remove_author(id);
                Ok(())
            })
            .await?;

        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }
}
