//! Persistence helpers around the embedded SQLite database. Each function
//! wraps one query or one transaction so the UI layer can stay focused on
//! state management.

mod connection;
mod program;
mod projector;
mod songs;

pub use connection::{ensure_schema, get_meta, set_meta};
pub use program::{load_program, save_program};
pub use projector::{load_projector_settings, save_projector_settings};
pub use songs::{
    delete_song, fetch_all_songs, fetch_song_ids, insert_songs, load_or_seed_songs, save_song,
};
