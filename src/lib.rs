pub mod bet_slip;
pub mod config;
pub mod demo_feed;
pub mod fixtures;
pub mod gemini;
pub mod http_client;
pub mod logging;
pub mod prompts;
pub mod provider;
pub mod response_parse;
pub mod service;
pub mod slip_export;
pub mod state;
