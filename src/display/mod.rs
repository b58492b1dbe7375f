/*
 *  display/mod.rs
 *
 *  departure-board - live departures on a dot matrix
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - drivers, hotspot compositor and render loop
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

// Core trait definitions
pub mod traits;
pub mod error;
pub mod factory;
pub mod font;

// Display drivers, hardware ones behind their features
pub mod drivers;

// UI components
pub mod components;

// Hotspot compositor
pub mod hotspot;
pub mod viewport;
pub mod layout;

// Render loop
pub mod controller;

// Re-exports for convenience
pub use traits::{DisplayCapabilities, DisplayDriver};
pub use error::{DisplayError, RenderError};
pub use factory::{BoxedDriver, DisplayDriverFactory};
pub use font::FontSet;
pub use hotspot::{Hotspot, HotspotKind};
pub use viewport::Viewport;
pub use layout::{compose_active, compose_blank, BoardSettings};
pub use controller::{select_state, BoardState, ControllerSettings, RefreshController};
