// Résumé analysis: request building, one workflow run, response normalization.
// All workflow calls go through workflow_client — nothing here talks HTTP directly.

pub mod analyzer;
pub mod handlers;
pub mod normalize;
pub mod request;
