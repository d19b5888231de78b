mod export;
mod food;
mod helpers;
mod settings;
mod summary;
mod weight;

pub(crate) use export::{ExportKind, cmd_export};
pub(crate) use food::{
    FoodArgs, cmd_food_add, cmd_food_delete, cmd_food_edit, cmd_food_list, cmd_food_saved,
    cmd_food_search,
};
pub(crate) use settings::{cmd_settings_clear, cmd_settings_set, cmd_settings_show};
pub(crate) use summary::cmd_summary;
pub(crate) use weight::{
    cmd_weight_add, cmd_weight_delete, cmd_weight_history, cmd_weight_latest, cmd_weight_list,
};
