use crate::domain::model::ResolutionResult;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry {
    result: ResolutionResult,
    produced_at: Instant,
    cycle: u64,
}

/// 單一槽位的結果快取，TTL 從結果產生的時間開始計算
pub struct ResultCache {
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// TTL 內回傳標記為 `cached` 的結果
    pub fn get(&self) -> Option<ResolutionResult> {
        self.lookup().ok()
    }

    /// 命中時回傳結果；未命中時回傳同一次讀取看到的週期編號，
    /// 之後用 `newer_than` 判斷等待期間是否已有新結果
    pub fn lookup(&self) -> Result<ResolutionResult, u64> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(entry) if entry.produced_at.elapsed() < self.ttl => {
                Ok(entry.result.clone().served_from_cache())
            }
            Some(entry) => Err(entry.cycle),
            None => Err(0),
        }
    }

    /// 覆寫槽位，回傳新的週期編號
    pub fn put(&self, result: ResolutionResult) -> u64 {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let cycle = slot.as_ref().map_or(0, |entry| entry.cycle) + 1;
        *slot = Some(CacheEntry {
            result,
            produced_at: Instant::now(),
            cycle,
        });
        cycle
    }

    /// 目前槽位的週期編號，空的時候是 0
    pub fn cycle(&self) -> u64 {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map_or(0, |entry| entry.cycle)
    }

    /// `cycle` 之後產生的結果（不看 TTL），用來把進行中的週期結果分享給等待者
    pub fn newer_than(&self, cycle: u64) -> Option<ResolutionResult> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|entry| entry.cycle > cycle)
            .map(|entry| entry.result.clone().served_from_cache())
    }
}
