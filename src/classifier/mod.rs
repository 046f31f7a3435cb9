// Text classification: trait-based abstraction over the toxicity detector.
//
// TextClassifier defines the interface. HeuristicClassifier implements it with
// script-range language detection and ordered regex rule tables. A trained
// model could replace it later without touching the store or session code.

pub mod heuristic;
pub mod language;
pub mod rules;
pub mod traits;
