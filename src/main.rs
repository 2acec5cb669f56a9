//! glance-board - query SQLite databases and keep dashboards over them.

use std::sync::Arc;

use glance_board::app::AppContext;
use glance_board::cli::{Cli, Command, DashboardCommand, OutputFormat};
use glance_board::config::Config;
use glance_board::error::{BoardError, Result};
use glance_board::logging;
use glance_board::output;
use glance_board::transform::TableView;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e.message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    if let Some(state) = &cli.state {
        config.state.path = Some(state.clone());
    }

    let ctx = AppContext::open(config).await?;

    let result = dispatch(&cli, &ctx).await;
    if let Err(e) = ctx.shutdown().await {
        warn!("Failed to close database: {}", e);
    }
    result
}

async fn dispatch(cli: &Cli, ctx: &AppContext) -> Result<()> {
    if !matches!(cli.command, Command::Create { .. }) {
        if let Some(path) = &cli.database {
            ctx.session().open_database(path).await?;
        }
    }

    match &cli.command {
        Command::Query {
            sql,
            sort,
            direction,
            page,
            page_size,
            history,
        } => {
            let mut view =
                TableView::new(page_size.unwrap_or(ctx.config().limits.table_page_size));
            if let Some(column) = sort {
                view.sort_by(column.as_str(), *direction);
            }
            view.set_page(page.saturating_sub(1));

            let mut outcome = Ok(());
            for statement in sql {
                match ctx.executor().execute(statement).await {
                    Ok(result) => {
                        let rows = view.apply(&result);
                        emit(
                            cli.output,
                            || output::render_result(&result, &view),
                            &json!({
                                "sql": statement,
                                "columns": result.columns,
                                "rows": rows,
                                "rowCount": result.row_count,
                                "executionTimeMs": result.execution_time_ms,
                            }),
                        )?;
                    }
                    Err(e) => {
                        outcome = Err(e);
                        break;
                    }
                }
            }

            if *history {
                let history = ctx.executor().history();
                let items: Vec<_> = history.iter().collect();
                emit(cli.output, || output::render_history(&history), &items)?;
            }
            outcome
        }

        Command::Tables {
            table,
            offset,
            limit,
        } => {
            require_database(ctx)?;
            match table {
                None => {
                    let tables = ctx.session().tables();
                    emit(cli.output, || output::render_tables(&tables), &*tables)
                }
                Some(name) => {
                    let schema = ctx.session().select_table(name).await?;
                    let limit = limit.unwrap_or(ctx.config().limits.table_page_size);
                    let data = ctx.executor().get_table_data(name, limit, *offset).await?;
                    emit(
                        cli.output,
                        || {
                            let rows: Vec<_> = data.rows.iter().collect();
                            format!(
                                "{}\n{}",
                                output::render_schema(&schema),
                                output::render_table(&data.columns, &rows)
                            )
                        },
                        &json!({ "schema": &*schema, "data": &*data }),
                    )
                }
            }
        }

        Command::Create { path } => {
            let info = ctx.session().create_database(path).await?;
            emit(cli.output, || format!("Created {}\n", info.path), &info)
        }

        Command::Recent => {
            let recent = ctx.session().recent_databases();
            emit(
                cli.output,
                || recent.iter().map(|p| format!("{p}\n")).collect(),
                &*recent,
            )
        }

        Command::Sample { dataset } => {
            require_database(ctx)?;
            ctx.create_sample_data(*dataset).await?;
            let tables = ctx.session().tables();
            emit(cli.output, || output::render_tables(&tables), &*tables)
        }

        Command::Dashboard(cmd) => dashboard_command(cli, ctx, cmd).await,
    }
}

async fn dashboard_command(cli: &Cli, ctx: &AppContext, cmd: &DashboardCommand) -> Result<()> {
    match cmd {
        DashboardCommand::List => {
            let dashboards = ctx.dashboards().dashboards();
            emit(
                cli.output,
                || output::render_dashboards(&dashboards),
                &*dashboards,
            )
        }

        DashboardCommand::Create { name } => {
            let dashboard = ctx.dashboards().create(name.as_str()).await.into_result()?;
            emit(
                cli.output,
                || format!("Created dashboard {} ({})\n", dashboard.name, dashboard.id),
                &dashboard,
            )
        }

        DashboardCommand::Rename { dashboard, name } => {
            let target = ctx.resolve_dashboard(dashboard)?;
            match ctx.rename_dashboard(&target.id, name).await {
                Some(outcome) => {
                    let renamed = outcome.into_result()?;
                    emit(
                        cli.output,
                        || format!("Renamed dashboard to {}\n", renamed.name),
                        &renamed,
                    )
                }
                None => emit(
                    cli.output,
                    || format!("Dashboard is already named {name}\n"),
                    &target,
                ),
            }
        }

        DashboardCommand::Delete { dashboard } => {
            let target = ctx.resolve_dashboard(dashboard)?;
            ctx.delete_dashboard(&target.id).await.into_result()?;
            emit(
                cli.output,
                || format!("Deleted dashboard {}\n", target.name),
                &json!({ "deleted": target.id }),
            )
        }

        DashboardCommand::AddWidget {
            dashboard,
            widget_type,
            title,
            query,
            ..
        } => {
            let target = ctx.resolve_dashboard(dashboard)?;
            let config = cmd.widget_config().unwrap_or_default();
            let widget = ctx
                .add_widget(&target.id, *widget_type, title, query, config)
                .await
                .ok_or_else(|| dashboard_not_found(dashboard))?
                .into_result()?;
            emit(
                cli.output,
                || format!("Added {} widget {} ({})\n", widget.widget_type, widget.title, widget.id),
                &widget,
            )
        }

        DashboardCommand::RemoveWidget {
            dashboard,
            widget_id,
        } => {
            let target = ctx.resolve_dashboard(dashboard)?;
            if target.widget(widget_id).is_none() {
                return Err(BoardError::not_found("Widget", widget_id));
            }
            let updated = ctx
                .remove_widget(&target.id, widget_id)
                .await
                .ok_or_else(|| dashboard_not_found(dashboard))?
                .into_result()?;
            emit(
                cli.output,
                || format!("Removed widget {widget_id}\n"),
                &updated,
            )
        }

        DashboardCommand::Show { dashboard } => {
            let target = ctx.resolve_dashboard(dashboard)?;
            let summary = ctx
                .select_dashboard(&target.id)
                .await
                .ok_or_else(|| dashboard_not_found(dashboard))?;
            for failure in &summary.failed {
                warn!("{}", failure);
            }

            let current = ctx
                .dashboards()
                .current()
                .unwrap_or_else(|| Arc::new(target.clone()));
            let coordinator = ctx.coordinator();
            let projections: Vec<_> = current
                .widgets
                .iter()
                .filter_map(|w| coordinator.projection(&w.id))
                .collect();
            let failed: Vec<_> = summary.failed.iter().map(|e| e.to_string()).collect();

            emit(
                cli.output,
                || {
                    output::render_dashboard(
                        &current,
                        ctx.config().limits.widget_preview_rows,
                        |id| (coordinator.projection(id), coordinator.state(id)),
                    )
                },
                &json!({
                    "dashboard": &*current,
                    "projections": projections,
                    "failed": failed,
                }),
            )
        }
    }
}

fn dashboard_not_found(key: &str) -> BoardError {
    BoardError::not_found("Dashboard", key)
}

fn require_database(ctx: &AppContext) -> Result<()> {
    if ctx.session().is_connected() {
        Ok(())
    } else {
        Err(BoardError::connection(
            "No database selected. Pass --database <PATH>",
        ))
    }
}

/// Prints either the text rendering or the JSON form of a command result.
fn emit<T, F>(format: OutputFormat, text: F, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Text => print!("{}", text()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| BoardError::internal(format!("Failed to encode output: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}
