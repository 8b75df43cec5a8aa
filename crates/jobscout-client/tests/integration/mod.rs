mod board_runs;
mod common;
