mod config_loading;
mod hysteresis;
mod regulation;
mod tracking;
