pub mod config;
pub mod error;
pub mod history;
pub mod sampler;
pub mod scoring;
pub mod signals;

pub use config::{Band, BiasConfig, LineConstraints, Mode, Preset, SignalWeights};
pub use error::{EngineError, Result};
pub use history::DrawHistory;
pub use sampler::{date_seed, generate, generate_lines, Generated, GeneratedLine, RankedNumber, Tag};
pub use scoring::{BiasModel, BiasScore, NumberStat, ScoreOutcome, SignalBreakdown};

/// Validates `config` against `history` and scores every number of the pool.
///
/// Short histories are not an error: confidence collapses and the model stays uniform.
pub fn analyze(history: &DrawHistory, config: &BiasConfig) -> Result<BiasModel> {
    config.validate()?;
    sampler::check_model_pool(history.pool(), config)?;

    let model = scoring::score_history(history, config);
    log::debug!(
        "{}: {} draws, windows {}/{}, mean confidence {:.4}",
        model.lottery,
        model.history_len,
        model.short_window,
        model.long_window,
        model.mean_confidence()
    );
    Ok(model)
}
