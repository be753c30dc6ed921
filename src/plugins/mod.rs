pub mod api;
pub mod live_table;
pub mod registry;
pub mod winner_loser;


use api::PluginFactory;

/// The statically-linked plugin set compiled into this build.
pub fn builtin_factories() -> Vec<PluginFactory> {
    vec![
        PluginFactory::new("winner_loser", || {
            Ok(Box::new(winner_loser::WinnerLoserPlugin::new()))
        }),
        PluginFactory::new("live_table", || {
            Ok(Box::new(live_table::LiveTablePlugin::new()))
        }),
    ]
}
