use chrono::NaiveDate;

use crate::{EngineError, Member, ReportStats, ResultEngine, Supplement, ids::Counter, report};

use super::Console;

impl Console {
    /// Current member list, in first-seen order.
    pub async fn members(&self) -> Vec<Member> {
        self.state.read().await.members.as_slice().to_vec()
    }

    pub async fn member(&self, member_id: &str) -> ResultEngine<Member> {
        self.state
            .read()
            .await
            .members
            .get(member_id)
            .cloned()
            .ok_or_else(|| EngineError::KeyNotFound(member_id.to_string()))
    }

    /// Current supplement list, in first-seen order.
    pub async fn supplements(&self) -> Vec<Supplement> {
        self.state.read().await.supplements.as_slice().to_vec()
    }

    /// Supplements of one member known locally.
    pub async fn supplements_for(&self, member_id: &str) -> Vec<Supplement> {
        self.state
            .read()
            .await
            .supplements
            .iter()
            .filter(|supplement| supplement.member_id == member_id)
            .cloned()
            .collect()
    }

    /// Next sequence number the given counter will mint.
    pub async fn next_sequence(&self, counter: Counter) -> i64 {
        let state = self.state.read().await;
        match counter {
            Counter::Member => state.member_counter.next(),
            Counter::Supplement => state.supplement_counter.next(),
        }
    }

    /// Summary statistics as of `today`.
    pub async fn report(&self, today: NaiveDate) -> ReportStats {
        let state = self.state.read().await;
        report::aggregate(
            state.members.as_slice(),
            state.supplements.as_slice(),
            today,
        )
    }
}
