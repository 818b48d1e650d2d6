//! Library crate for party-rooms-back: server-authoritative rooms for a category
//! race and a draw & guess game, exposed over HTTP and WebSocket.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod services;
pub mod state;
