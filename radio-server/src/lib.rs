//! Radio station directory server.
//!
//! A web application for finding radio stations on a map: search by name,
//! call sign or place, browse the stations in view, and keep a short list
//! of favourites.

pub mod auth;
pub mod config;
pub mod directory;
pub mod domain;
pub mod query;
pub mod store;
pub mod web;
