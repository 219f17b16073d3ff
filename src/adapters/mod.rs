// Adapters layer: concrete collaborators for the media server and the list service.

pub mod http;
pub mod plex;
pub mod trakt;
