use log::{debug, warn};

use crate::error::{IngestError, Result};
use crate::model::{Side, Team, TeamId};
use crate::parse::squad_id_from_link;
use crate::source::RawMatchRecord;
use crate::store::MatchStore;

// No locking happens here. A racing creation of the same name is detected through
// the store's uniqueness constraint and resolved by re-reading the winning row.
pub struct TeamResolver<'a, S: MatchStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MatchStore + ?Sized> TeamResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn resolve(&self, name: &str, side: Side, record: &RawMatchRecord) -> Result<TeamId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IngestError::Validation {
                field: match side {
                    Side::Home => "homeTeam",
                    Side::Away => "awayTeam",
                },
            });
        }

        if let Some(team) = self.store.find_team_by_name(name)? {
            return Ok(team.id);
        }

        let link = record.team_link(side).unwrap_or_default();
        let id = squad_id_from_link(link).ok_or_else(|| {
            IngestError::extraction(
                match side {
                    Side::Home => "homeTeamLink",
                    Side::Away => "awayTeamLink",
                },
                link,
            )
        })?;

        let team = Team {
            id: TeamId(id),
            name: name.to_string(),
        };
        match self.store.create_team(&team) {
            Ok(()) => {
                debug!(
                    "created team {} ({}) from {} side of {}",
                    team.name, team.id, side, record.match_reference
                );
                Ok(team.id)
            }
            Err(err) if err.is_conflict() => {
                warn!("team {name} was created concurrently; re-reading");
                self.store
                    .find_team_by_name(name)?
                    .map(|t| t.id)
                    .ok_or(err)
            }
            Err(err) => Err(err),
        }
    }
}
