//! Default preset and user options merge
//!
//! A [`PresetMerger`] loads the user's options file, lays its rule tables
//! over the [`Preset`] at the pattern-key level and normalizes the
//! remaining options into [`CompiledOptions`].

mod merge;
mod options;

pub use merge::{
    merge_rule_tables, CompiledModule, CompiledOptions, Entry, OutputOptions, Preset, PresetMerger,
};
pub use options::{
    load_options, parse_options, EntryOption, EntryPoints, ModuleOptions, OutputObject,
    OutputOption, UserOptions, DEFAULT_OPTIONS_FILE,
};
