use crate::*;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Votes received by one candidate
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CandidateResult {
    pub candidate: Candidate,
    pub votes: u64,
}

/// One accepted ballot, as published in the audit trail
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoterResult {
    pub voter_id: Uuid,
    pub candidate_id: i32,
}

/// The tally and audit trail produced by the election commission
///
/// The audit trail lists every accepted ballot by its ephemeral voter id, in acceptance order,
/// so each voter can check their vote was counted without revealing who they are.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VotingResults {
    pub candidates: BTreeMap<i32, CandidateResult>,
    pub audit_trail: Vec<VoterResult>,
}

impl VotingResults {
    /// Create an empty tally. Candidate ids must be unique.
    pub fn new(candidates: impl IntoIterator<Item = Candidate>) -> Result<Self> {
        let mut results = VotingResults::default();
        for candidate in candidates {
            let id = candidate.id;
            if results.candidates.contains_key(&id) {
                return Err(Error::DuplicateCandidate(id));
            }
            results
                .candidates
                .insert(id, CandidateResult { candidate, votes: 0 });
        }
        Ok(results)
    }

    pub fn contains_candidate(&self, candidate_id: i32) -> bool {
        self.candidates.contains_key(&candidate_id)
    }

    pub fn votes_for(&self, candidate_id: i32) -> Option<u64> {
        self.candidates.get(&candidate_id).map(|r| r.votes)
    }

    pub fn total_votes(&self) -> u64 {
        self.candidates.values().map(|r| r.votes).sum()
    }

    /// Candidates ordered by votes, most first. Ties are broken by candidate id.
    pub fn ranked(&self) -> Vec<&CandidateResult> {
        let mut ranked: Vec<&CandidateResult> = self.candidates.values().collect();
        ranked.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.candidate.id.cmp(&b.candidate.id))
        });
        ranked
    }

    /// Publishable JSON rendition of the results
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Count a validated ballot. The candidate must already be known.
    pub(crate) fn record(&mut self, ballot: &Ballot) {
        if let Some(result) = self.candidates.get_mut(&ballot.candidate_id) {
            result.votes += 1;
            self.audit_trail.push(VoterResult {
                voter_id: ballot.voter_id,
                candidate_id: ballot.candidate_id,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(1, "Ishaan Allison"),
            Candidate::new(2, "Oliver Mendez"),
            Candidate::new(3, "Naomi Winter"),
        ]
    }

    #[test]
    fn tally_and_rank() {
        let mut results = VotingResults::new(candidates()).unwrap();
        assert_eq!(results.total_votes(), 0);

        for candidate_id in &[2, 3, 2, 1, 2, 3] {
            results.record(&Ballot::new(Uuid::new_v4(), Uuid::new_v4(), *candidate_id));
        }

        assert_eq!(results.votes_for(1), Some(1));
        assert_eq!(results.votes_for(2), Some(3));
        assert_eq!(results.votes_for(3), Some(2));
        assert_eq!(results.votes_for(4), None);
        assert_eq!(results.total_votes(), 6);
        assert_eq!(results.audit_trail.len(), 6);
        assert_eq!(results.audit_trail[0].candidate_id, 2);

        let ranked: Vec<i32> = results.ranked().iter().map(|r| r.candidate.id).collect();
        assert_eq!(ranked, vec![2, 3, 1]);
    }

    #[test]
    fn ranking_ties_by_id() {
        let results = VotingResults::new(candidates()).unwrap();
        let ranked: Vec<i32> = results.ranked().iter().map(|r| r.candidate.id).collect();
        assert_eq!(ranked, vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_candidates() {
        let mut list = candidates();
        list.push(Candidate::new(2, "Someone Else"));
        assert!(matches!(
            VotingResults::new(list),
            Err(Error::DuplicateCandidate(2))
        ));
    }

    #[test]
    fn results_json() {
        let mut results = VotingResults::new(candidates()).unwrap();
        let voter_id = Uuid::new_v4();
        results.record(&Ballot::new(voter_id, Uuid::new_v4(), 3));

        let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
        assert_eq!(json["candidates"]["3"]["votes"], 1);
        assert_eq!(json["candidates"]["3"]["candidate"]["full_name"], "Naomi Winter");
        assert_eq!(json["audit_trail"][0]["voter_id"], voter_id.to_string());
    }
}
