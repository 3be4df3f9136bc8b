#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use assembly_tally::api::gallery::CountFetcher;
use assembly_tally::model::{AssembleCount, DatePlan};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Returns queued counts per date key, then 0 once a queue runs dry.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, VecDeque<AssembleCount>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new<'a>(script: impl IntoIterator<Item = (&'a str, Vec<AssembleCount>)>) -> Self {
        ScriptedFetcher {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), VecDeque::from(v)))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, key: &str) -> usize {
        self.calls().iter().filter(|k| k.as_str() == key).count()
    }
}

#[async_trait]
impl CountFetcher for ScriptedFetcher {
    async fn fetch_count(&self, plan: &DatePlan) -> AssembleCount {
        let key = plan.date_key.to_string();
        self.calls.lock().unwrap().push(key.clone());
        self.script
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(0)
    }
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
