use anyhow::Context;
use clap::Parser;
use hospital_espacios::adapters::csv_export;
use hospital_espacios::config::cli::{Command, DepartamentoCommand, ServicioCommand};
use hospital_espacios::core::{DepartamentoRepository, ServiciosMedicosEspaciosRepository};
use hospital_espacios::utils::error::ErrorSeverity;
use hospital_espacios::utils::{logger, validation::Validate};
use hospital_espacios::{
    CliConfig, Departamento, Espacio, EspacioError, EspacioService, EspacioUpdate, Estatus,
    MemoryStore, SnapshotFile, TipoEspacio, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let mut config = match TomlConfig::from_file_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file is valid TOML");
            std::process::exit(1);
        }
    };
    if let Some(data) = &cli.data {
        config.store.snapshot_path = data.clone();
    }

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    if config.logging.json {
        logger::init_json_logger(level);
    } else {
        logger::init_cli_logger(level);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
    tracing::debug!("Config: {:?}", config);

    let snapshot = SnapshotFile::new(config.snapshot_path());
    let tables = snapshot
        .load()
        .await
        .with_context(|| format!("loading {}", snapshot.path().display()))?;
    let store = MemoryStore::from_tables(tables);
    let service = EspacioService::new(store.clone());

    match run(cli.command, &service, &store, &config).await {
        Ok(mutated) => {
            if mutated {
                snapshot
                    .save(&store.snapshot().await)
                    .await
                    .with_context(|| format!("saving {}", snapshot.path().display()))?;
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Operation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 4,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

/// Runs one command. Returns whether the tables changed and need saving.
async fn run(
    command: Command,
    service: &EspacioService<MemoryStore>,
    store: &MemoryStore,
    config: &TomlConfig,
) -> Result<bool, EspacioError> {
    match command {
        Command::Crear(args) => {
            let espacio = service.crear(args.into()).await?;
            println!("{}", espacio.id);
            Ok(true)
        }
        Command::Actualizar(args) => {
            let (id, cambios) = args.into_parts();
            let (espacio, escrito) = service.aplicar_cambios(&id, cambios).await?;
            print_espacio(&espacio);
            Ok(escrito)
        }
        Command::Estatus { id, estatus } => {
            let estatus: Estatus = estatus.parse()?;
            let cambios = EspacioUpdate {
                estatus: Some(estatus.to_string()),
                ..Default::default()
            };
            let (espacio, escrito) = service.aplicar_cambios(&id, cambios).await?;
            println!("{} -> {}", espacio.id, espacio.estatus);
            Ok(escrito)
        }
        Command::Eliminar { id } => {
            let espacio = service.eliminar(&id).await?;
            println!("Deleted {} ({})", espacio.id, espacio.nombre);
            Ok(true)
        }
        Command::Mostrar { id } => {
            let espacio = service.obtener(&id).await?;
            print_espacio(&espacio);
            let ruta = service.ruta(&id).await?;
            if !ruta.is_empty() {
                let nombres: Vec<&str> = ruta.iter().map(|e| e.nombre.as_str()).collect();
                println!("ruta: {}", nombres.join(" < "));
            }
            for link in store.servicios_de(&id).await? {
                println!("servicio: {} (vínculo {})", link.servicio_medico_id, link.id);
            }
            Ok(false)
        }
        Command::Listar => {
            for espacio in service.listar().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    espacio.id, espacio.tipo, espacio.estatus, espacio.nombre
                );
            }
            Ok(false)
        }
        Command::Arbol => {
            print!("{}", service.arbol().await?);
            Ok(false)
        }
        Command::Exportar { output } => {
            let espacios = service.listar().await?;
            match output.as_deref().or(config.csv_export_path()) {
                Some(path) => {
                    let file = std::fs::File::create(path)?;
                    csv_export::write_espacios(file, &espacios)?;
                    tracing::info!("📁 Exported {} espacios to {}", espacios.len(), path);
                }
                None => csv_export::write_espacios(std::io::stdout().lock(), &espacios)?,
            }
            Ok(false)
        }
        Command::Tipos => {
            for tipo in TipoEspacio::ALL {
                println!("{}", tipo);
            }
            Ok(false)
        }
        Command::Departamento(DepartamentoCommand::Alta { id, nombre }) => {
            let departamento = store
                .insert_departamento(Departamento::new(id, nombre)?)
                .await?;
            println!("{}", departamento.id);
            Ok(true)
        }
        Command::Departamento(DepartamentoCommand::Baja { id }) => {
            store.delete_departamento(&id).await?;
            println!("Deleted departamento {}", id);
            Ok(true)
        }
        Command::Departamento(DepartamentoCommand::Listar) => {
            for departamento in store.list_departamentos().await? {
                println!("{}\t{}", departamento.id, departamento.nombre);
            }
            Ok(false)
        }
        Command::Servicio(ServicioCommand::Vincular {
            servicio_medico_id,
            espacio_id,
        }) => {
            let link = store.link(&servicio_medico_id, &espacio_id).await?;
            println!("{}", link.id);
            Ok(true)
        }
        Command::Servicio(ServicioCommand::Desvincular { id }) => {
            store.unlink(&id).await?;
            Ok(true)
        }
        Command::Servicio(ServicioCommand::Listar { espacio_id }) => {
            for link in store.servicios_de(&espacio_id).await? {
                println!("{}\t{}", link.id, link.servicio_medico_id);
            }
            Ok(false)
        }
    }
}

fn print_espacio(espacio: &Espacio) {
    let opt = |v: Option<&str>| v.unwrap_or("-").to_string();
    println!("id: {}", espacio.id);
    println!("tipo: {}", espacio.tipo);
    println!("nombre: {}", espacio.nombre);
    println!("estatus: {}", espacio.estatus);
    println!("departamento_id: {}", opt(espacio.departamento_id.as_deref()));
    println!(
        "capacidad: {}",
        espacio
            .capacidad
            .map_or_else(|| "-".to_string(), |c| c.to_string())
    );
    println!(
        "espacio_superior_id: {}",
        opt(espacio.espacio_superior_id.as_deref())
    );
    println!("fecha_registro: {}", espacio.fecha_registro.to_rfc3339());
    println!(
        "fecha_actualizacion: {}",
        espacio
            .fecha_actualizacion
            .map_or_else(|| "-".to_string(), |f| f.to_rfc3339())
    );
}
