// Draft engine: pick schedule, ledger, rosters, needs, and the shared session.

pub mod board;
pub mod ledger;
pub mod needs;
pub mod player;
pub mod roster;
pub mod session;
