//! Property registry: fractionalized assets and their admin flags.
//!
//! An asset is created once at fractionalization time; `total_shares` and
//! `total_value` are frozen from that point. The registry owns the
//! `trading_enabled` and `active` toggles the rest of the engine consults.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::types::asset::{Asset, AssetId};
use crate::types::money::Money;

/// Keyed store of fractionalized assets.
#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    assets: HashMap<AssetId, Asset>,
    next_asset_id: u64,
}

impl PropertyRegistry {
    /// Create an empty registry (asset ids start at 1)
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            next_asset_id: 1,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up an asset by id
    #[inline]
    pub fn get(&self, asset_id: AssetId) -> Result<&Asset, EngineError> {
        self.assets.get(&asset_id).ok_or(EngineError::AssetNotFound)
    }

    /// Number of registered assets
    #[inline]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check whether the registry is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Ensure the asset exists and is active
    pub fn ensure_active(&self, asset_id: AssetId) -> Result<&Asset, EngineError> {
        let asset = self.get(asset_id)?;
        if !asset.active {
            return Err(EngineError::AssetInactive);
        }
        Ok(asset)
    }

    /// Ensure the asset exists, is active, and has trading enabled
    pub fn ensure_tradeable(&self, asset_id: AssetId) -> Result<&Asset, EngineError> {
        let asset = self.ensure_active(asset_id)?;
        if !asset.trading_enabled {
            return Err(EngineError::TradingDisabled);
        }
        Ok(asset)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Register a fractionalized property.
    ///
    /// `total_shares` and `total_value` must be positive; both are frozen
    /// after this call. Returns the new asset id.
    pub fn fractionalize(
        &mut self,
        total_value: Money,
        total_shares: u64,
        now: u64,
    ) -> Result<AssetId, EngineError> {
        if total_shares == 0 || total_value == 0 {
            return Err(EngineError::InvalidAmount);
        }

        let id = self.next_asset_id;
        self.next_asset_id += 1;
        self.assets.insert(id, Asset::new(id, total_value, total_shares, now));
        Ok(id)
    }

    /// Enable peer-to-peer trading for the asset
    pub fn enable_trading(&mut self, asset_id: AssetId) -> Result<(), EngineError> {
        let asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(EngineError::AssetNotFound)?;
        if !asset.active {
            return Err(EngineError::AssetInactive);
        }
        asset.trading_enabled = true;
        Ok(())
    }

    /// Disable peer-to-peer trading for the asset
    pub fn disable_trading(&mut self, asset_id: AssetId) -> Result<(), EngineError> {
        let asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(EngineError::AssetNotFound)?;
        asset.trading_enabled = false;
        Ok(())
    }

    /// Deactivate the asset (blocks new orders and dividend pools;
    /// existing balances are untouched)
    pub fn deactivate(&mut self, asset_id: AssetId) -> Result<(), EngineError> {
        let asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(EngineError::AssetNotFound)?;
        asset.active = false;
        asset.trading_enabled = false;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
