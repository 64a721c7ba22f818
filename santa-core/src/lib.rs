use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub type ParticipantName = String;
pub type CharacterId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Real,
    Demo,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Real
    }
}

/// Game configuration injected at construction: the closed participant
/// roster, the character catalog, and the fixed mutual pairings that
/// override the random draw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Roster {
    pub participants: Vec<ParticipantName>,
    pub characters: Vec<CharacterId>,
    #[serde(default)]
    pub special_pairings: HashMap<ParticipantName, ParticipantName>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            participants: ["Asif", "Mehreen", "Tahir", "Simran", "Sobia"]
                .into_iter()
                .map(String::from)
                .collect(),
            characters: ["santa", "elf", "reindeer", "snowman", "gingerbread"]
                .into_iter()
                .map(String::from)
                .collect(),
            special_pairings: [("Asif", "Mehreen"), ("Mehreen", "Asif")]
                .into_iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }
}

impl Roster {
    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }

    pub fn has_character(&self, id: &str) -> bool {
        self.characters.iter().any(|c| c == id)
    }

    /// Fixed partner for a specially paired participant, if any.
    pub fn partner_of(&self, name: &str) -> Option<&str> {
        self.special_pairings.get(name).map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), RosterError> {
        if self.participants.is_empty() {
            return Err(RosterError::EmptyRoster);
        }
        if self.characters.len() < self.participants.len() {
            return Err(RosterError::NotEnoughCharacters);
        }

        let mut names = HashSet::new();
        for name in &self.participants {
            if !names.insert(name.as_str()) {
                return Err(RosterError::DuplicateName(name.clone()));
            }
        }
        let mut characters = HashSet::new();
        for id in &self.characters {
            if !characters.insert(id.as_str()) {
                return Err(RosterError::DuplicateCharacter(id.clone()));
            }
        }

        for (a, b) in &self.special_pairings {
            if a == b {
                return Err(RosterError::SelfPairing(a.clone()));
            }
            if !names.contains(a.as_str()) {
                return Err(RosterError::PairingUnknownParticipant(a.clone()));
            }
            if !names.contains(b.as_str()) {
                return Err(RosterError::PairingUnknownParticipant(b.clone()));
            }
            // Pairings are mutual: pair(a) = b requires pair(b) = a.
            if self.special_pairings.get(b) != Some(a) {
                return Err(RosterError::PairingNotSymmetric(a.clone(), b.clone()));
            }
        }

        Ok(())
    }

    /// Names pre-claimed by their paired partner. The random draw must
    /// never hand these out, even before the partner has played.
    fn reserved(&self) -> HashSet<&str> {
        self.special_pairings.values().map(String::as_str).collect()
    }
}

/// Mode-scoped view of the round at the moment a participant plays:
/// which names are already claimed as recipients, and which participants
/// have taken their turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSnapshot {
    pub claimed: HashSet<ParticipantName>,
    pub played: HashSet<ParticipantName>,
}

impl RoundSnapshot {
    pub fn from_assignments<'a, I>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut snapshot = Self::default();
        for (player, recipient) in assignments {
            snapshot.played.insert(player.to_string());
            snapshot.claimed.insert(recipient.to_string());
        }
        snapshot
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster has no participants")]
    EmptyRoster,
    #[error("fewer characters than participants")]
    NotEnoughCharacters,
    #[error("duplicate participant name: {0}")]
    DuplicateName(String),
    #[error("duplicate character: {0}")]
    DuplicateCharacter(String),
    #[error("participant paired with themselves: {0}")]
    SelfPairing(String),
    #[error("pairing references unknown participant: {0}")]
    PairingUnknownParticipant(String),
    #[error("pairing is not mutual: {0} -> {1}")]
    PairingNotSymmetric(String, String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("unknown participant")]
    UnknownParticipant,
    #[error("no recipients available")]
    NoCandidates,
}

/// Decides who `player` gives a gift to.
///
/// A specially paired player always receives the fixed partner. Everyone
/// else draws uniformly from the roster minus themselves, minus recipients
/// already claimed, minus names reserved for a pairing. When exactly one
/// unpaired voter has yet to play after this turn, candidates that would
/// leave that voter with no legal recipient are filtered out first.
pub fn resolve_assignment<R: Rng + ?Sized>(
    roster: &Roster,
    player: &str,
    snapshot: &RoundSnapshot,
    rng: &mut R,
) -> Result<ParticipantName, AssignError> {
    if !roster.has_participant(player) {
        return Err(AssignError::UnknownParticipant);
    }

    if let Some(partner) = roster.partner_of(player) {
        return Ok(partner.to_string());
    }

    let reserved = roster.reserved();
    let candidates: Vec<&str> = roster
        .participants
        .iter()
        .map(String::as_str)
        .filter(|c| *c != player && !snapshot.claimed.contains(*c) && !reserved.contains(*c))
        .collect();

    if candidates.is_empty() {
        return Err(AssignError::NoCandidates);
    }

    let filtered: Vec<&str> = match lone_remaining_voter(roster, player, snapshot) {
        Some(last) => candidates
            .iter()
            .copied()
            .filter(|c| !strands_last_voter(roster, last, c, snapshot, &reserved))
            .collect(),
        None => candidates.clone(),
    };

    let pool = if filtered.is_empty() {
        tracing::warn!(player, "every candidate strands the last voter, drawing unfiltered");
        &candidates
    } else {
        &filtered
    };

    pool.choose(rng)
        .map(|c| (*c).to_string())
        .ok_or(AssignError::NoCandidates)
}

/// The sole unpaired participant, other than `player`, who has not taken
/// a turn yet. Returns None when zero or several remain; the deadlock
/// guard only defends the final-player case.
fn lone_remaining_voter<'a>(
    roster: &'a Roster,
    player: &str,
    snapshot: &RoundSnapshot,
) -> Option<&'a str> {
    let mut remaining = roster.participants.iter().map(String::as_str).filter(|n| {
        *n != player
            && !roster.special_pairings.contains_key(*n)
            && !snapshot.played.contains(*n)
    });
    let first = remaining.next()?;
    match remaining.next() {
        Some(_) => None,
        None => Some(first),
    }
}

/// True when handing out `candidate` now would leave `last` with no open
/// recipient except themselves.
fn strands_last_voter(
    roster: &Roster,
    last: &str,
    candidate: &str,
    snapshot: &RoundSnapshot,
    reserved: &HashSet<&str>,
) -> bool {
    !roster.participants.iter().map(String::as_str).any(|t| {
        t != last && t != candidate && !snapshot.claimed.contains(t) && !reserved.contains(t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn roster(names: &[&str], pairs: &[(&str, &str)]) -> Roster {
        Roster {
            participants: names.iter().map(|n| n.to_string()).collect(),
            characters: (0..names.len()).map(|i| format!("character-{i}")).collect(),
            special_pairings: pairs
                .iter()
                .flat_map(|(a, b)| [(a.to_string(), b.to_string()), (b.to_string(), a.to_string())])
                .collect(),
        }
    }

    fn snapshot(assignments: &[(&str, &str)]) -> RoundSnapshot {
        RoundSnapshot::from_assignments(assignments.iter().copied())
    }

    #[test]
    fn paired_players_always_receive_their_partner() {
        let roster = roster(&["A", "B", "C", "D", "E"], &[("A", "B")]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let first = resolve_assignment(&roster, "A", &snapshot(&[]), &mut rng).unwrap();
        assert_eq!(first, "B");

        // Order does not matter: B gets A back whether or not A has played.
        let second = resolve_assignment(&roster, "B", &snapshot(&[("A", "B")]), &mut rng).unwrap();
        assert_eq!(second, "A");
        let unplayed = resolve_assignment(&roster, "B", &snapshot(&[]), &mut rng).unwrap();
        assert_eq!(unplayed, "A");
    }

    #[test]
    fn unknown_participant_rejected() {
        let roster = roster(&["A", "B"], &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = resolve_assignment(&roster, "Z", &snapshot(&[]), &mut rng).unwrap_err();
        assert_eq!(err, AssignError::UnknownParticipant);
    }

    #[test]
    fn pool_excludes_self_claimed_and_reserved_names() {
        let roster = roster(&["A", "B", "C", "D", "E"], &[("A", "B")]);
        // D cannot draw itself, the claimed E, or the reserved A and B;
        // C is the only name left in the pool.
        let state = snapshot(&[("A", "B"), ("B", "A"), ("C", "E")]);
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let assigned = resolve_assignment(&roster, "D", &state, &mut rng).unwrap();
            assert_eq!(assigned, "C");
        }
    }

    #[test]
    fn look_ahead_rejects_choice_that_strands_last_voter() {
        let roster = roster(&["A", "B", "C", "D", "E"], &[("A", "B")]);
        // A and B are paired off, C took D. D now draws with only E left
        // to play. Taking C would leave E facing an empty pool, so every
        // seed must hand D the name E.
        let state = snapshot(&[("A", "B"), ("B", "A"), ("C", "D")]);
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let assigned = resolve_assignment(&roster, "D", &state, &mut rng).unwrap();
            assert_eq!(assigned, "E", "seed {seed} stranded the last voter");
        }
    }

    #[test]
    fn no_filtering_while_two_or_more_voters_remain() {
        let roster = roster(&["A", "B", "C", "D", "E"], &[("A", "B")]);
        // C plays first of the unpaired three; D and E both still to come,
        // so both stay in the pool and both come up across seeds.
        let state = snapshot(&[("A", "B"), ("B", "A")]);
        let mut seen = HashSet::new();
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            seen.insert(resolve_assignment(&roster, "C", &state, &mut rng).unwrap());
        }
        let expected: HashSet<String> = ["D", "E"].into_iter().map(String::from).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn fallback_draws_unfiltered_when_guard_rejects_everything() {
        let roster = roster(&["A", "B", "C"], &[]);
        // Only C is drawable for A, and C is also the lone voter left; the
        // guard rejects it, the fallback hands it out anyway.
        let state = RoundSnapshot {
            claimed: ["A", "B"].into_iter().map(String::from).collect(),
            played: ["B"].into_iter().map(String::from).collect(),
        };
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let assigned = resolve_assignment(&roster, "A", &state, &mut rng).unwrap();
            assert_eq!(assigned, "C");
        }
    }

    #[test]
    fn empty_pool_is_an_error() {
        let roster = roster(&["A"], &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = resolve_assignment(&roster, "A", &snapshot(&[]), &mut rng).unwrap_err();
        assert_eq!(err, AssignError::NoCandidates);
    }

    #[test]
    fn full_rounds_hold_invariants_for_every_seed_and_order() {
        let roster = Roster::default();
        for seed in 0..200u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut order = roster.participants.clone();
            order.shuffle(&mut rng);

            let mut state = RoundSnapshot::default();
            let mut assignments: HashMap<String, String> = HashMap::new();
            for player in &order {
                let assigned = resolve_assignment(&roster, player, &state, &mut rng)
                    .expect("a full round never deadlocks");
                assert_ne!(&assigned, player, "seed {seed}: self-assignment");
                assert!(
                    state.claimed.insert(assigned.clone()),
                    "seed {seed}: {assigned} received two santas"
                );
                state.played.insert(player.clone());
                assignments.insert(player.clone(), assigned);
            }

            assert_eq!(assignments["Asif"], "Mehreen");
            assert_eq!(assignments["Mehreen"], "Asif");
            let recipients: HashSet<&String> = assignments.values().collect();
            assert_eq!(recipients.len(), roster.participants.len());
        }
    }

    #[test]
    fn default_roster_is_valid() {
        assert_eq!(Roster::default().validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_bad_configurations() {
        assert_eq!(roster(&[], &[]).validate(), Err(RosterError::EmptyRoster));

        let mut short = roster(&["A", "B"], &[]);
        short.characters.truncate(1);
        assert_eq!(short.validate(), Err(RosterError::NotEnoughCharacters));

        let mut duped = roster(&["A", "A"], &[]);
        duped.characters = vec!["x".into(), "y".into()];
        assert_eq!(duped.validate(), Err(RosterError::DuplicateName("A".into())));

        let mut dup_char = roster(&["A", "B"], &[]);
        dup_char.characters = vec!["x".into(), "x".into()];
        assert_eq!(
            dup_char.validate(),
            Err(RosterError::DuplicateCharacter("x".into()))
        );

        let mut selfpair = roster(&["A", "B"], &[]);
        selfpair
            .special_pairings
            .insert("A".to_string(), "A".to_string());
        assert_eq!(selfpair.validate(), Err(RosterError::SelfPairing("A".into())));

        let mut unknown = roster(&["A", "B"], &[]);
        unknown
            .special_pairings
            .insert("A".to_string(), "Z".to_string());
        assert_eq!(
            unknown.validate(),
            Err(RosterError::PairingUnknownParticipant("Z".into()))
        );

        let mut oneway = roster(&["A", "B", "C"], &[]);
        oneway
            .special_pairings
            .insert("A".to_string(), "B".to_string());
        assert_eq!(
            oneway.validate(),
            Err(RosterError::PairingNotSymmetric("A".into(), "B".into()))
        );
    }

    #[test]
    fn roster_config_deserializes_without_pairings() {
        let roster: Roster = serde_json::from_str(
            r#"{"participants":["A","B","C"],"characters":["x","y","z"]}"#,
        )
        .unwrap();
        assert!(roster.special_pairings.is_empty());
        assert_eq!(roster.validate(), Ok(()));
    }
}
