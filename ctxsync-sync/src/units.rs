//! Syncing a [`StateUnit`] instead of a [`ctxsync_model::LocalState`].
//!
//! The unit's `timestamp_modified` plays the part of `dateModified`: a push
//! stamps the remote with it, and a pull sets it explicitly to the remote's
//! stamp, so a unit and its remote agree after either transfer. A unit's
//! stamp never drops below its creation time; when a pulled stamp is older
//! than that, the remote is restamped to the unit's.

use crate::engine::SyncEngine;
use crate::error::{SoftFailure, SyncOutcome};
use crate::SyncResult;
use ctxsync_model::remote::{date_modified_of, stamp, strip_meta};
use ctxsync_unit::{SetOptions, StateUnit, UnitKind, UnitValue};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::debug;

impl SyncEngine {
    /// Pushes the unit's flattened value, which must be an object.
    pub fn push_unit(&mut self, unit: &StateUnit) -> SyncResult<SyncOutcome> {
        let flattened = unit.peek_value().to_json();
        if !self.validator().require_object(&flattened, "unit")? {
            return Ok(self.skip(SoftFailure::RejectedInput("unit")));
        }
        let data = match flattened {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        self.push_data(&data, unit.timestamp_modified())
    }

    /// Replaces the unit's value with the remote object. A container
    /// receives each field wrapped in a `Property` unit, so its child policy
    /// still applies; a rejected field is a `Unit` error and leaves the unit
    /// untouched.
    pub fn pull_unit(&mut self, unit: &mut StateUnit) -> SyncResult<SyncOutcome> {
        let remote = match self.fetch_object()? {
            Ok(object) => object,
            Err(reason) => return Ok(self.skip(reason)),
        };
        let remote_ts = date_modified_of(&remote);
        let value = into_unit_value(unit.kind(), strip_meta(remote.clone()));
        unit.set_value(value, SetOptions::explicit(remote_ts))?;
        let pulled_ts = unit.timestamp_modified();
        if pulled_ts > remote_ts {
            let mut aligned = remote;
            stamp(&mut aligned, pulled_ts);
            self.update_remote_context(aligned)?;
            debug!(remote = remote_ts, unit = pulled_ts, "remote restamped to unit creation time");
        }
        debug!(kind = unit.kind().name(), date_modified = pulled_ts, "pulled into unit");
        Ok(SyncOutcome::Pulled {
            date_modified: unit.timestamp_modified(),
        })
    }

    /// Timestamp-driven choice between [`SyncEngine::push_unit`] and
    /// [`SyncEngine::pull_unit`]; a tie does nothing.
    pub fn sync_unit(&mut self, unit: &mut StateUnit) -> SyncResult<SyncOutcome> {
        let remote = match self.fetch_object()? {
            Ok(object) => object,
            Err(reason) => return Ok(self.skip(reason)),
        };
        match unit.timestamp_modified().cmp(&date_modified_of(&remote)) {
            Ordering::Greater => self.push_unit(unit),
            Ordering::Less => self.pull_unit(unit),
            Ordering::Equal => Ok(SyncOutcome::Unchanged),
        }
    }
}

fn into_unit_value(kind: UnitKind, remote: Map<String, Value>) -> UnitValue {
    match kind {
        UnitKind::Property => UnitValue::from(Value::Object(remote)),
        UnitKind::Container => UnitValue::Object(
            remote
                .into_iter()
                .map(|(k, v)| (k, UnitValue::from(StateUnit::property(v))))
                .collect(),
        ),
    }
}
