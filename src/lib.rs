//! Single-player terminal Minesweeper.
//!
//! `msw_board` holds the grid and its reveal/flag rules, `msw_game` drives a
//! session on top of it, and `msw_ui` is the crossterm/ratatui front end.

pub mod msw_board;  // Grid state, mine placement and flood fill
pub mod msw_color;  // Cross-platform color matching utilities
pub mod msw_config; // Configuration file and defaults
pub mod msw_error;  // Configuration error types
pub mod msw_game;   // Session state machine and input dispatch
pub mod msw_timer;  // Elapsed-time stopwatch
pub mod msw_ui;     // Terminal UI rendering and event handling
