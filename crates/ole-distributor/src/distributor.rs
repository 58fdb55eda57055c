//! The distributor aggregate: state, collaborators, clock, and the
//! all-or-nothing commit discipline shared by every operation.
//!
//! Operations live in the sibling modules as further `impl Distributor`
//! blocks:
//! - [`registry`](crate::registry): epoch creation, recycle, penalty withdrawal
//! - [`ledger`](crate::ledger): membership-gated claims
//! - [`vesting`](crate::vesting): linear release and withdrawal
//! - [`exit`](crate::exit): early exit under the penalty curve
//! - [`convert`](crate::convert): conversion into governance locks

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use ole_core::constants::{MAX_LOCK_DURATION, PERCENT_DIVISOR};
use ole_core::error::DistributorError;
use ole_core::traits::{ExitCurve, GovernanceLock, MembershipVerifier, PriceOracle, TokenLedger};
use ole_core::types::{AccountId, Amount, Claim, Epoch, EpochId, Timestamp};
use ole_curve::PenaltyCurve;

use crate::config::Settings;
use crate::events::DistributorEvent;
use crate::state::DistributorState;

/// External services the distributor calls into.
#[derive(Clone)]
pub struct Collaborators {
    /// Ledger of the token being distributed.
    pub reward_token: Arc<dyn TokenLedger>,
    /// Ledger of the asset paired with rewards on conversion.
    pub paired_token: Arc<dyn TokenLedger>,
    pub membership: Arc<dyn MembershipVerifier>,
    pub oracle: Arc<dyn PriceOracle>,
    pub lock: Arc<dyn GovernanceLock>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Epoch-based reward distributor.
///
/// Every `&mut self` operation either commits all of its state changes,
/// outbound calls, and events, or returns an error with state and event log
/// unchanged.
pub struct Distributor {
    pub(crate) state: DistributorState,
    pub(crate) reward_token: Arc<dyn TokenLedger>,
    pub(crate) paired_token: Arc<dyn TokenLedger>,
    pub(crate) membership: Arc<dyn MembershipVerifier>,
    pub(crate) oracle: Arc<dyn PriceOracle>,
    pub(crate) lock: Arc<dyn GovernanceLock>,
    pub(crate) curve: Arc<dyn ExitCurve>,
    clock: Box<dyn Fn() -> u64 + Send + Sync>,
    events: Vec<DistributorEvent>,
}

impl fmt::Debug for Distributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Distributor")
            .field("epoch_count", &self.state.epoch_count)
            .field("claims", &self.state.claims.len())
            .field("penalty_pool", &self.state.penalty_pool)
            .finish_non_exhaustive()
    }
}

impl Distributor {
    /// Create a distributor using the system clock.
    pub fn new(settings: Settings, collaborators: Collaborators) -> Self {
        Self::with_clock(settings, collaborators, || {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        })
    }

    /// Create a distributor with a custom clock (unix seconds).
    pub fn with_clock(
        settings: Settings,
        collaborators: Collaborators,
        clock: impl Fn() -> u64 + Send + Sync + 'static,
    ) -> Self {
        Self::from_state(DistributorState::new(&settings), collaborators, clock)
    }

    /// Resume from previously exported state.
    pub fn from_state(
        state: DistributorState,
        collaborators: Collaborators,
        clock: impl Fn() -> u64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            state,
            reward_token: collaborators.reward_token,
            paired_token: collaborators.paired_token,
            membership: collaborators.membership,
            oracle: collaborators.oracle,
            lock: collaborators.lock,
            curve: Arc::new(PenaltyCurve::new()),
            clock: Box::new(clock),
            events: Vec::new(),
        }
    }

    /// Replace the exit curve.
    pub fn with_curve(mut self, curve: Arc<dyn ExitCurve>) -> Self {
        self.curve = curve;
        self
    }

    pub(crate) fn now(&self) -> Timestamp {
        (self.clock)()
    }

    // --- Commit discipline ---

    /// Run `op` against the live state; on error restore the state and
    /// event log captured before the call.
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, DistributorError>,
    ) -> Result<T, DistributorError> {
        let saved = self.state.clone();
        let mark = self.events.len();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.state = saved;
                self.events.truncate(mark);
                debug!(code = err.code(), %err, "operation rejected");
                Err(err)
            }
        }
    }

    pub(crate) fn emit(&mut self, event: DistributorEvent) {
        debug!(?event, "event");
        self.events.push(event);
    }

    // --- Authorization ---

    pub(crate) fn require_admin(&self, caller: &AccountId) -> Result<(), DistributorError> {
        if *caller == self.state.admin {
            Ok(())
        } else {
            Err(DistributorError::Unauthorized(caller.to_string()))
        }
    }

    pub(crate) fn require_epoch_creator(&self, caller: &AccountId) -> Result<(), DistributorError> {
        if *caller == self.state.admin || self.state.operator.as_ref() == Some(caller) {
            Ok(())
        } else {
            Err(DistributorError::Unauthorized(caller.to_string()))
        }
    }

    // --- Admin settings ---

    /// Set the minimum remaining lock duration required by conversions.
    pub fn set_min_lock_duration(
        &mut self,
        caller: &AccountId,
        duration: u64,
    ) -> Result<(), DistributorError> {
        self.require_admin(caller)?;
        if duration > MAX_LOCK_DURATION {
            return Err(DistributorError::InvalidTime);
        }
        let old = std::mem::replace(&mut self.state.min_lock_duration, duration);
        info!(old, new = duration, "min lock duration changed");
        self.emit(DistributorEvent::MinLockDurationChanged { old, new: duration });
        Ok(())
    }

    /// Set the tolerated spot/reference price deviation for conversions.
    pub fn set_max_price_deviation(
        &mut self,
        caller: &AccountId,
        bps: u64,
    ) -> Result<(), DistributorError> {
        self.require_admin(caller)?;
        if bps > PERCENT_DIVISOR {
            return Err(DistributorError::InvalidAmount);
        }
        let old = std::mem::replace(&mut self.state.max_price_deviation_bps, bps);
        info!(old, new = bps, "max price deviation changed");
        self.emit(DistributorEvent::MaxPriceDeviationChanged { old, new: bps });
        Ok(())
    }

    /// Grant or revoke the operator role.
    pub fn set_operator(
        &mut self,
        caller: &AccountId,
        operator: Option<AccountId>,
    ) -> Result<(), DistributorError> {
        self.require_admin(caller)?;
        self.state.operator = operator;
        info!(operator = ?operator.map(|o| o.to_string()), "operator changed");
        self.emit(DistributorEvent::OperatorChanged { operator });
        Ok(())
    }

    // --- Queries ---

    pub fn epoch(&self, id: EpochId) -> Option<&Epoch> {
        self.state.epochs.get(&id)
    }

    pub fn claim(&self, id: EpochId, account: &AccountId) -> Option<&Claim> {
        self.state.claims.get(&(id, *account))
    }

    /// Number of epochs created so far (also the latest id).
    pub fn epoch_count(&self) -> EpochId {
        self.state.epoch_count
    }

    pub fn withdrawable_penalty(&self) -> Amount {
        self.state.penalty_pool
    }

    pub fn min_lock_duration(&self) -> u64 {
        self.state.min_lock_duration
    }

    pub fn max_price_deviation_bps(&self) -> u64 {
        self.state.max_price_deviation_bps
    }

    pub fn admin(&self) -> &AccountId {
        &self.state.admin
    }

    pub fn operator(&self) -> Option<&AccountId> {
        self.state.operator.as_ref()
    }

    pub fn state(&self) -> &DistributorState {
        &self.state
    }

    /// Bincode snapshot of the full state.
    pub fn snapshot(&self) -> Result<Vec<u8>, DistributorError> {
        self.state.to_bytes()
    }

    // --- Events ---

    pub fn events(&self) -> &[DistributorEvent] {
        &self.events
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<DistributorEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, ADMIN, ALICE, OPERATOR};
    use ole_core::constants::DAY;

    #[test]
    fn admin_setters_require_admin() {
        let mut h = Harness::new();
        assert_eq!(
            h.distributor.set_min_lock_duration(&ALICE, DAY).unwrap_err().code(),
            "Unauthorized"
        );
        assert_eq!(
            h.distributor.set_max_price_deviation(&ALICE, 10).unwrap_err().code(),
            "Unauthorized"
        );
        assert_eq!(
            h.distributor.set_operator(&ALICE, Some(ALICE)).unwrap_err().code(),
            "Unauthorized"
        );
        assert!(h.distributor.events().is_empty());
    }

    #[test]
    fn set_min_lock_duration_updates_and_emits() {
        let mut h = Harness::new();
        let before = h.distributor.min_lock_duration();
        h.distributor.set_min_lock_duration(&ADMIN, 7 * DAY).unwrap();
        assert_eq!(h.distributor.min_lock_duration(), 7 * DAY);
        assert_eq!(
            h.distributor.drain_events(),
            vec![DistributorEvent::MinLockDurationChanged { old: before, new: 7 * DAY }]
        );
        assert!(h.distributor.events().is_empty());
    }

    #[test]
    fn set_min_lock_duration_bounded_by_max_lock() {
        let mut h = Harness::new();
        assert_eq!(
            h.distributor
                .set_min_lock_duration(&ADMIN, MAX_LOCK_DURATION + 1)
                .unwrap_err(),
            DistributorError::InvalidTime
        );
    }

    #[test]
    fn set_max_price_deviation_bounded() {
        let mut h = Harness::new();
        h.distributor.set_max_price_deviation(&ADMIN, 0).unwrap();
        assert_eq!(h.distributor.max_price_deviation_bps(), 0);
        assert_eq!(
            h.distributor
                .set_max_price_deviation(&ADMIN, PERCENT_DIVISOR + 1)
                .unwrap_err(),
            DistributorError::InvalidAmount
        );
    }

    #[test]
    fn operator_role_can_be_revoked() {
        let mut h = Harness::new();
        assert_eq!(h.distributor.operator(), Some(&OPERATOR));
        h.distributor.set_operator(&ADMIN, None).unwrap();
        assert_eq!(h.distributor.operator(), None);
    }

    #[test]
    fn transact_restores_state_and_events() {
        let mut h = Harness::new();
        h.distributor.set_min_lock_duration(&ADMIN, DAY).unwrap();
        let before = h.distributor.state().clone();
        let result: Result<(), DistributorError> = h.distributor.transact(|d| {
            d.state.penalty_pool = 99;
            d.emit(DistributorEvent::OperatorChanged { operator: None });
            Err(DistributorError::TransferFailed)
        });
        assert_eq!(result, Err(DistributorError::TransferFailed));
        assert_eq!(h.distributor.state(), &before);
        assert_eq!(h.distributor.events().len(), 1);
    }

    #[test]
    fn snapshot_resumes() {
        let mut h = Harness::new();
        h.distributor.set_min_lock_duration(&ADMIN, 2 * DAY).unwrap();
        let bytes = h.distributor.snapshot().unwrap();
        let state = DistributorState::from_bytes(&bytes).unwrap();
        let resumed = Distributor::from_state(state, h.collaborators(), || 0);
        assert_eq!(resumed.min_lock_duration(), 2 * DAY);
        assert_eq!(resumed.admin(), &ADMIN);
    }

    #[test]
    fn debug_hides_collaborators() {
        let h = Harness::new();
        let text = format!("{:?}", h.distributor);
        assert!(text.starts_with("Distributor"));
        assert!(text.contains("epoch_count: 0"));
    }
}
