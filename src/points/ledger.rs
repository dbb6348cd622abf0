//! Points ledger over an external shop table.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PointsDbSettings;
use crate::db::{Assignment, Connector, Filter, Query, NULL_TEXT};
use crate::PluginError;

/// Points-related errors.
#[derive(Error, Debug)]
pub enum PointsError {
    /// Negative cost; -1 marks a command whose cost was never set.
    #[error("invalid cost: {0}")]
    InvalidCost(i64),

    /// Required table or column name is empty, or the store is missing.
    #[error("points store misconfigured: {0}")]
    Misconfigured(String),

    /// The player has no account row.
    #[error("no points account for player {0}")]
    AccountNotFound(String),

    /// Balance lower than the cost.
    #[error("not enough points: balance {balance}, cost {cost}")]
    InsufficientPoints { balance: i64, cost: i64 },

    /// The balance column holds something that is not a number.
    #[error("unreadable points balance: {0:?}")]
    InvalidBalance(String),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] PluginError),
}

/// Parse a stored balance. NULL counts as 0; decimal values are truncated.
fn parse_balance(text: &str) -> Result<i64, PointsError> {
    if text == NULL_TEXT {
        return Ok(0);
    }
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .or_else(|_| trimmed.parse::<f64>().map(|f| f.trunc() as i64))
        .map_err(|_| PointsError::InvalidBalance(text.to_string()))
}

/// Checks and spends player points.
pub struct PointsLedger {
    store: Option<Arc<dyn Connector>>,
    settings: PointsDbSettings,
    debug: bool,
}

impl PointsLedger {
    /// Create a ledger. `store` is `None` when the points store is disabled.
    pub fn new(store: Option<Arc<dyn Connector>>, settings: &PointsDbSettings, debug: bool) -> Self {
        Self {
            store,
            settings: settings.clone(),
            debug,
        }
    }

    /// Whether costs are checked against storage.
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Toggle debug logging (config reload).
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn store(&self) -> Result<&Arc<dyn Connector>, PointsError> {
        let s = &self.settings;
        for (key, value) in [
            ("TableName", &s.table_name),
            ("UniqueIDField", &s.unique_id_field),
            ("PointsField", &s.points_field),
        ] {
            if value.is_empty() {
                return Err(PointsError::Misconfigured(format!("{key} is empty")));
            }
        }
        self.store
            .as_ref()
            .ok_or_else(|| PointsError::Misconfigured("no points connector".to_string()))
    }

    async fn read_balance(
        &self,
        store: &Arc<dyn Connector>,
        player_id: &str,
    ) -> Result<Option<i64>, PointsError> {
        let query = Query::select(&self.settings.table_name)
            .filter(Filter::eq(&self.settings.unique_id_field, player_id))
            .limit(1);
        let rows = store.read(&query).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let text = row.get(&self.settings.points_field).ok_or_else(|| {
            PointsError::Misconfigured(format!(
                "column {} missing from {}",
                self.settings.points_field, self.settings.table_name
            ))
        })?;
        parse_balance(text).map(Some)
    }

    /// Current balance of a player.
    pub async fn balance(&self, player_id: &str) -> Result<i64, PointsError> {
        let store = self.store()?;
        self.read_balance(store, player_id)
            .await?
            .ok_or_else(|| PointsError::AccountNotFound(player_id.to_string()))
    }

    /// Check whether a player can pay `cost`, or spend it.
    ///
    /// A zero cost and a disabled store always succeed without touching
    /// storage. Spending is a single conditional update, so the balance can
    /// never go below zero even when two spends race.
    pub async fn check_or_spend(
        &self,
        player_id: &str,
        cost: i64,
        check_only: bool,
    ) -> Result<(), PointsError> {
        if cost < 0 {
            warn!(player = %player_id, cost, "command has an invalid cost");
            return Err(PointsError::InvalidCost(cost));
        }
        if cost == 0 {
            return Ok(());
        }
        if !self.settings.enabled {
            debug!("points store disabled, cost {} ignored", cost);
            return Ok(());
        }
        let store = self.store()?;

        if check_only {
            let balance = self
                .read_balance(store, player_id)
                .await?
                .ok_or_else(|| PointsError::AccountNotFound(player_id.to_string()))?;
            if self.debug {
                info!(player = %player_id, balance, cost, "points check");
            }
            return if balance >= cost {
                Ok(())
            } else {
                Err(PointsError::InsufficientPoints { balance, cost })
            };
        }

        let s = &self.settings;
        let mut assignments = vec![Assignment::decrement(&s.points_field, cost)];
        if let Some(total) = s.total_spent_column() {
            assignments.push(Assignment::increment(total, cost));
        }
        let filters = [
            Filter::eq(&s.unique_id_field, player_id),
            Filter::ge(&s.points_field, cost),
        ];
        let affected = store.update(&s.table_name, &assignments, &filters).await?;
        if affected > 0 {
            if self.debug {
                info!(player = %player_id, cost, "points spent");
            }
            return Ok(());
        }

        match self.read_balance(store, player_id).await? {
            None => Err(PointsError::AccountNotFound(player_id.to_string())),
            Some(balance) => {
                if self.debug {
                    info!(player = %player_id, balance, cost, "spend refused");
                }
                Err(PointsError::InsufficientPoints { balance, cost })
            }
        }
    }

    /// Check that a player can pay `cost`.
    pub async fn check(&self, player_id: &str, cost: i64) -> Result<(), PointsError> {
        self.check_or_spend(player_id, cost, true).await
    }

    /// Spend `cost` from a player's balance.
    pub async fn spend(&self, player_id: &str, cost: i64) -> Result<(), PointsError> {
        self.check_or_spend(player_id, cost, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_settings() -> PointsDbSettings {
        PointsDbSettings {
            enabled: true,
            ..PointsDbSettings::default()
        }
    }

    #[test]
    fn test_parse_balance() {
        assert_eq!(parse_balance("42").unwrap(), 42);
        assert_eq!(parse_balance(" 7 ").unwrap(), 7);
        assert_eq!(parse_balance("NULL").unwrap(), 0);
        assert_eq!(parse_balance("12.9").unwrap(), 12);
        assert!(matches!(
            parse_balance("lots"),
            Err(PointsError::InvalidBalance(_))
        ));
    }

    #[tokio::test]
    async fn test_negative_cost_is_invalid() {
        let ledger = PointsLedger::new(None, &PointsDbSettings::default(), false);
        assert!(matches!(
            ledger.check("p1", -1).await,
            Err(PointsError::InvalidCost(-1))
        ));
        assert!(matches!(
            ledger.spend("p1", -5).await,
            Err(PointsError::InvalidCost(-5))
        ));
    }

    #[tokio::test]
    async fn test_zero_cost_needs_no_store() {
        let ledger = PointsLedger::new(None, &enabled_settings(), false);
        assert!(ledger.check("p1", 0).await.is_ok());
        assert!(ledger.spend("p1", 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_store_passes() {
        let ledger = PointsLedger::new(None, &PointsDbSettings::default(), false);
        assert!(!ledger.is_enabled());
        assert!(ledger.check("p1", 1000).await.is_ok());
        assert!(ledger.spend("p1", 1000).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_names_are_misconfigured() {
        let settings = PointsDbSettings {
            points_field: String::new(),
            ..enabled_settings()
        };
        let ledger = PointsLedger::new(None, &settings, false);
        assert!(matches!(
            ledger.check("p1", 5).await,
            Err(PointsError::Misconfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_enabled_without_connector_is_misconfigured() {
        let ledger = PointsLedger::new(None, &enabled_settings(), false);
        assert!(matches!(
            ledger.spend("p1", 5).await,
            Err(PointsError::Misconfigured(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = PointsError::InsufficientPoints {
            balance: 3,
            cost: 10,
        };
        assert_eq!(err.to_string(), "not enough points: balance 3, cost 10");
    }
}
