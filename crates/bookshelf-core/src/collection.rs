//! In-memory operations on a loaded collection
//!
//! None of these persist anything. Callers load the whole collection,
//! apply one of these, then hand the result back to
//! [`BookRepository::save_all`](crate::store::BookRepository::save_all).

use crate::models::Book;

/// Find the position of the book whose id loosely matches `raw_id`
pub fn find_by_id(books: &[Book], raw_id: &str) -> Option<usize> {
    books.iter().position(|book| book.matches_id(raw_id))
}

/// Books whose status equals `status` exactly, in collection order
pub fn with_status(books: &[Book], status: &str) -> Vec<Book> {
    books
        .iter()
        .filter(|book| book.status == status)
        .cloned()
        .collect()
}

/// Add a book at the end of the collection
pub fn append(books: &mut Vec<Book>, book: Book) {
    books.push(book);
}

/// Change the status of a book, returning the updated record
pub fn update_status<'a>(books: &'a mut [Book], raw_id: &str, status: &str) -> Option<&'a Book> {
    let index = find_by_id(books, raw_id)?;
    books[index].set_status(status);
    Some(&books[index])
}

/// Remove a book, returning it
pub fn remove(books: &mut Vec<Book>, raw_id: &str) -> Option<Book> {
    let index = find_by_id(books, raw_id)?;
    Some(books.remove(index))
}
