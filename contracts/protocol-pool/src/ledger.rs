use cosmwasm_std::{Addr, Order, StdResult, Storage};
use cw_storage_plus::{Bound, Map};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Walks one recipient store in key order, one record per `next` call.
///
/// The cursor only remembers the last key it yielded and re-opens the range
/// after it on every step, so no storage borrow outlives a call. That lets the
/// caller overwrite (or remove) the record it was just handed before asking
/// for the next one. Records inserted behind the cursor are not visited.
pub struct RecordCursor<T> {
    map: Map<&'static Addr, T>,
    last: Option<Addr>,
}

impl<T> RecordCursor<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(map: Map<&'static Addr, T>) -> Self {
        RecordCursor { map, last: None }
    }

    pub fn next(&mut self, storage: &dyn Storage) -> StdResult<Option<(Addr, T)>> {
        let min = self.last.as_ref().map(Bound::exclusive);
        let next = self
            .map
            .range(storage, min, None, Order::Ascending)
            .next()
            .transpose()?;

        if let Some((key, _)) = &next {
            self.last = Some(key.clone());
        }
        Ok(next)
    }
}
