//! Romsprite - Library for extracting sprite graphics from SNES ROM images
//!
//! This library provides functionality to:
//! - Read and patch SNES ROM images in any of the common memory layouts
//! - Decode 4bpp tiles and OAM-style tilemaps into indexed canvases
//! - Locate Samus' poses, DMA transfers and palette animations in Super Metroid
//! - Resolve sprite sheet metadata and compose labeled sprite sheets

pub mod canvas;
pub mod cli;
pub mod color;
pub mod config;
pub mod hierarchy;
pub mod metroid3;
pub mod output;
pub mod rom;
pub mod sheet;
pub mod testing;
pub mod tile;
pub mod vram;
