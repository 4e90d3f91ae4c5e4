pub mod anim;
pub mod app;
pub mod batch;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pokeapi;
pub mod tui;
