use crate::domain::model::{EspacioUpdate, NuevoEspacio};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "espacios")]
#[command(about = "Manage the physical spaces of a hospital")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "espacios.toml")]
    pub config: String,

    /// Snapshot file, overrides store.snapshot_path
    #[arg(long)]
    pub data: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register a new space
    Crear(CrearArgs),
    /// Change fields of an existing space
    Actualizar(ActualizarArgs),
    /// Set a space to Activo or Inactivo
    Estatus { id: String, estatus: String },
    /// Delete a space; children and service links are detached
    Eliminar { id: String },
    /// Show one space with its superior chain and linked services
    Mostrar { id: String },
    /// List every space
    Listar,
    /// Print the space hierarchy
    Arbol,
    /// Write tbc_espacios as CSV
    Exportar {
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the accepted space types
    Tipos,
    #[command(subcommand)]
    Departamento(DepartamentoCommand),
    #[command(subcommand)]
    Servicio(ServicioCommand),
}

#[derive(Debug, Clone, Args)]
pub struct CrearArgs {
    #[arg(long)]
    pub tipo: String,
    #[arg(long)]
    pub nombre: String,
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub departamento: Option<String>,
    #[arg(long)]
    pub estatus: Option<String>,
    #[arg(long)]
    pub capacidad: Option<i32>,
    #[arg(long)]
    pub superior: Option<String>,
}

impl From<CrearArgs> for NuevoEspacio {
    fn from(args: CrearArgs) -> Self {
        NuevoEspacio {
            id: args.id,
            tipo: args.tipo,
            nombre: args.nombre,
            departamento_id: args.departamento,
            estatus: args.estatus,
            capacidad: args.capacidad,
            espacio_superior_id: args.superior,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ActualizarArgs {
    pub id: String,
    #[arg(long)]
    pub tipo: Option<String>,
    #[arg(long)]
    pub nombre: Option<String>,
    #[arg(long, conflicts_with = "sin_departamento")]
    pub departamento: Option<String>,
    #[arg(long)]
    pub sin_departamento: bool,
    #[arg(long)]
    pub estatus: Option<String>,
    #[arg(long, conflicts_with = "sin_capacidad")]
    pub capacidad: Option<i32>,
    #[arg(long)]
    pub sin_capacidad: bool,
    #[arg(long, conflicts_with = "sin_superior")]
    pub superior: Option<String>,
    #[arg(long)]
    pub sin_superior: bool,
}

fn nullable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

impl ActualizarArgs {
    pub fn into_parts(self) -> (String, EspacioUpdate) {
        let cambios = EspacioUpdate {
            tipo: self.tipo,
            nombre: self.nombre,
            departamento_id: nullable(self.departamento, self.sin_departamento),
            estatus: self.estatus,
            capacidad: nullable(self.capacidad, self.sin_capacidad),
            espacio_superior_id: nullable(self.superior, self.sin_superior),
        };
        (self.id, cambios)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum DepartamentoCommand {
    /// Register a department that spaces can reference
    Alta { id: String, nombre: String },
    /// Remove a department; its spaces keep existing without one
    Baja { id: String },
    Listar,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ServicioCommand {
    /// Link a medical service to a space
    Vincular {
        servicio_medico_id: String,
        espacio_id: String,
    },
    /// Remove a link by its id
    Desvincular { id: String },
    /// Medical services linked to a space
    Listar { espacio_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crear() {
        let cli = CliConfig::try_parse_from([
            "espacios",
            "crear",
            "--tipo",
            "Sala de Espera",
            "--nombre",
            "Espera 1",
            "--capacidad",
            "30",
        ])
        .unwrap();
        let Command::Crear(args) = cli.command else {
            panic!("expected crear");
        };
        let nuevo: NuevoEspacio = args.into();
        assert_eq!(nuevo.tipo, "Sala de Espera");
        assert_eq!(nuevo.capacidad, Some(30));
        assert_eq!(nuevo.estatus, None);
        assert_eq!(cli.config, "espacios.toml");
    }

    #[test]
    fn test_parse_actualizar_clears_nullable_columns() {
        let cli = CliConfig::try_parse_from([
            "espacios",
            "--data",
            "/tmp/x.json",
            "actualizar",
            "abc",
            "--sin-superior",
            "--nombre",
            "Nuevo",
        ])
        .unwrap();
        assert_eq!(cli.data.as_deref(), Some("/tmp/x.json"));
        let Command::Actualizar(args) = cli.command else {
            panic!("expected actualizar");
        };
        let (id, cambios) = args.into_parts();
        assert_eq!(id, "abc");
        assert_eq!(cambios.espacio_superior_id, Some(None));
        assert_eq!(cambios.nombre.as_deref(), Some("Nuevo"));
        assert_eq!(cambios.departamento_id, None);
    }

    #[test]
    fn test_conflicting_flags_rejected() {
        let result = CliConfig::try_parse_from([
            "espacios",
            "actualizar",
            "abc",
            "--capacidad",
            "3",
            "--sin-capacidad",
        ]);
        assert!(result.is_err());
    }
}
