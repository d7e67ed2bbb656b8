pub mod canon;
pub mod congestion;
pub mod coords;
pub mod gazetteer;
pub mod portswitch;
pub mod risk;
pub mod searoute;
pub mod voyage;
