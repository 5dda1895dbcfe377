use chrono::Utc;
use serde_json::json;

use crate::{
    EngineError, Outcome, ResultEngine, Supplement, SupplementNew, ids::Counter,
    store::Collection,
};

use super::{Console, encode};

impl Console {
    /// Records a supplement sale.
    ///
    /// The member must be known locally, otherwise nothing is written and
    /// [`EngineError::MemberNotFound`] is returned. The member name is copied
    /// onto the sale and not kept in sync afterwards.
    pub async fn add_supplement(
        &self,
        payload: SupplementNew,
    ) -> ResultEngine<Outcome<Supplement>> {
        let _minting = self.minting.lock().await;
        let (member, sequence) = {
            let state = self.state.read().await;
            let member = state.members.get(&payload.member_id).cloned();
            (member, state.supplement_counter.next())
        };
        let Some(member) = member else {
            tracing::info!(member_id = %payload.member_id, "supplement for unknown member");
            return Err(EngineError::MemberNotFound(payload.member_id));
        };
        let following = Counter::Supplement.after(sequence)?;

        let supplement = Supplement::record(
            payload,
            &member,
            Counter::Supplement.format(sequence),
            Utc::now(),
        )?;
        let node = encode(&supplement)?;

        self.write(Collection::Supplements, &supplement.id, Some(node))
            .await;
        self.write(
            Collection::Counters,
            Counter::Supplement.key(),
            Some(json!(following)),
        )
        .await;

        tracing::info!(id = %supplement.id, member_id = %member.id, "supplement added");
        Ok(Outcome::new(supplement, "Supplement added successfully!"))
    }
}
