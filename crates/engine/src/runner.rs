use crate::cycle::TradingCycle;
use crate::error::EngineError;
use crate::ports::BotRepository;
use core_types::TradingBot;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use uuid::Uuid;

/// Marks a stored bot as running and persists it.
pub async fn start_bot(bots: &dyn BotRepository, id: Uuid) -> Result<TradingBot, EngineError> {
    let mut bot = bots.get(id).await?.ok_or(EngineError::BotNotFound(id))?;
    bot.start()?;
    bots.update(&bot).await?;
    tracing::info!(bot_id = %id, symbol = bot.symbol(), "Bot started");
    Ok(bot)
}

/// Marks a stored bot as stopped. A running [`run_bot`] loop notices on its next tick.
pub async fn stop_bot(bots: &dyn BotRepository, id: Uuid) -> Result<TradingBot, EngineError> {
    let mut bot = bots.get(id).await?.ok_or(EngineError::BotNotFound(id))?;
    bot.stop()?;
    bots.update(&bot).await?;
    tracing::info!(bot_id = %id, "Bot stopped");
    Ok(bot)
}

/// Drives `bot` through one cycle per `interval_seconds` until `stop` flips to `true`,
/// the sender is dropped, or the stored bot is no longer running.
///
/// A failed cycle is logged and the loop carries on with the next tick. Returns the
/// bot as it stood when the loop ended.
pub async fn run_bot(cycle: &TradingCycle, mut bot: TradingBot, mut stop: watch::Receiver<bool>) -> TradingBot {
    if !bot.is_running() {
        tracing::warn!(bot_id = %bot.id(), status = %bot.status(), "Bot is not running, nothing to do");
        return bot;
    }

    let mut ticker = interval(Duration::from_secs(bot.settings().interval_seconds));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(
        bot_id = %bot.id(),
        symbol = bot.symbol(),
        strategy = cycle.strategy().id().as_str(),
        interval_seconds = bot.settings().interval_seconds,
        "Trading loop started"
    );

    loop {
        if *stop.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        match cycle.ports().bots.get(bot.id()).await {
            Ok(Some(stored)) if !stored.is_running() => {
                tracing::info!(bot_id = %bot.id(), "Bot was stopped, leaving trading loop");
                bot = stored;
                break;
            }
            Ok(None) => {
                tracing::warn!(bot_id = %bot.id(), "Bot no longer exists, leaving trading loop");
                break;
            }
            Ok(Some(_)) => {}
            Err(e) => {
                tracing::error!(bot_id = %bot.id(), error = %e, "Could not refresh bot status");
                continue;
            }
        }

        match cycle.execute(&mut bot).await {
            Ok(outcome) => tracing::debug!(bot_id = %bot.id(), ?outcome, "Cycle finished"),
            Err(e) => tracing::error!(bot_id = %bot.id(), error = %e, "Cycle failed"),
        }
    }

    tracing::info!(bot_id = %bot.id(), "Trading loop finished");
    bot
}
