use crate::error::StrategyError;
use crate::grid::Grid;
use crate::mean_reversion::MeanReversion;
use crate::momentum::Momentum;
use crate::Strategy;
use configuration::Strategies;
use core_types::enums::StrategyId;

/// Creates a new strategy instance based on the provided ID and configuration.
///
/// The compiler will error if a new `StrategyId` is added but not handled here.
pub fn create_strategy(
    id: StrategyId,
    config: &Strategies,
) -> Result<Box<dyn Strategy>, StrategyError> {
    match id {
        StrategyId::Momentum => Ok(Box::new(Momentum::new(config.momentum.clone())?)),
        StrategyId::MeanReversion => Ok(Box::new(MeanReversion::new(
            config.mean_reversion.clone(),
        )?)),
        StrategyId::Grid => Ok(Box::new(Grid::new(config.grid.clone())?)),
    }
}
