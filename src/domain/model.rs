use crate::utils::error::{EspacioError, Result};
use crate::utils::validation::{
    validate_identifier, validate_max_length, validate_min, validate_non_empty_string,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const TABLE_NAME: &str = "tbc_espacios";
pub const NOMBRE_MAX_LEN: usize = 100;

/// Kind of physical space inside the hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipoEspacio {
    Consultorio,
    Laboratorio,
    #[serde(rename = "Quirófano")]
    Quirofano,
    #[serde(rename = "Sala de Espera")]
    SalaDeEspera,
    Edificio,
    Estacionamiento,
    #[serde(rename = "Habitación")]
    Habitacion,
    Cama,
    #[serde(rename = "Sala Maternidad")]
    SalaMaternidad,
    Cunero,
    Anfiteatro,
    Oficina,
    #[serde(rename = "Sala de Juntas")]
    SalaDeJuntas,
    Auditorio,
    Cafeteria,
    Capilla,
    Farmacia,
    Ventanilla,
    #[serde(rename = "Recepción")]
    Recepcion,
    Piso,
}

impl TipoEspacio {
    pub const ALL: [TipoEspacio; 20] = [
        TipoEspacio::Consultorio,
        TipoEspacio::Laboratorio,
        TipoEspacio::Quirofano,
        TipoEspacio::SalaDeEspera,
        TipoEspacio::Edificio,
        TipoEspacio::Estacionamiento,
        TipoEspacio::Habitacion,
        TipoEspacio::Cama,
        TipoEspacio::SalaMaternidad,
        TipoEspacio::Cunero,
        TipoEspacio::Anfiteatro,
        TipoEspacio::Oficina,
        TipoEspacio::SalaDeJuntas,
        TipoEspacio::Auditorio,
        TipoEspacio::Cafeteria,
        TipoEspacio::Capilla,
        TipoEspacio::Farmacia,
        TipoEspacio::Ventanilla,
        TipoEspacio::Recepcion,
        TipoEspacio::Piso,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TipoEspacio::Consultorio => "Consultorio",
            TipoEspacio::Laboratorio => "Laboratorio",
            TipoEspacio::Quirofano => "Quirófano",
            TipoEspacio::SalaDeEspera => "Sala de Espera",
            TipoEspacio::Edificio => "Edificio",
            TipoEspacio::Estacionamiento => "Estacionamiento",
            TipoEspacio::Habitacion => "Habitación",
            TipoEspacio::Cama => "Cama",
            TipoEspacio::SalaMaternidad => "Sala Maternidad",
            TipoEspacio::Cunero => "Cunero",
            TipoEspacio::Anfiteatro => "Anfiteatro",
            TipoEspacio::Oficina => "Oficina",
            TipoEspacio::SalaDeJuntas => "Sala de Juntas",
            TipoEspacio::Auditorio => "Auditorio",
            TipoEspacio::Cafeteria => "Cafeteria",
            TipoEspacio::Capilla => "Capilla",
            TipoEspacio::Farmacia => "Farmacia",
            TipoEspacio::Ventanilla => "Ventanilla",
            TipoEspacio::Recepcion => "Recepción",
            TipoEspacio::Piso => "Piso",
        }
    }
}

impl fmt::Display for TipoEspacio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipoEspacio {
    type Err = EspacioError;

    fn from_str(s: &str) -> Result<Self> {
        TipoEspacio::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                EspacioError::validation("tipo", s, "Not a recognized space type literal")
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Estatus {
    #[default]
    Activo,
    Inactivo,
}

impl Estatus {
    pub const ALL: [Estatus; 2] = [Estatus::Activo, Estatus::Inactivo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Estatus::Activo => "Activo",
            Estatus::Inactivo => "Inactivo",
        }
    }

    pub fn toggled(&self) -> Estatus {
        match self {
            Estatus::Activo => Estatus::Inactivo,
            Estatus::Inactivo => Estatus::Activo,
        }
    }
}

impl fmt::Display for Estatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estatus {
    type Err = EspacioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Activo" => Ok(Estatus::Activo),
            "Inactivo" => Ok(Estatus::Inactivo),
            other => Err(EspacioError::validation(
                "estatus",
                other,
                "Not a recognized status literal",
            )),
        }
    }
}

/// A row of `tbc_espacios`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Espacio {
    pub id: String,
    pub tipo: TipoEspacio,
    pub nombre: String,
    pub departamento_id: Option<String>,
    pub estatus: Estatus,
    pub fecha_registro: DateTime<Utc>,
    pub fecha_actualizacion: Option<DateTime<Utc>>,
    pub capacidad: Option<i32>,
    pub espacio_superior_id: Option<String>,
}

/// Creation payload. Enumerations arrive as text and are checked in
/// [`Espacio::create`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NuevoEspacio {
    pub id: Option<String>,
    pub tipo: String,
    pub nombre: String,
    pub departamento_id: Option<String>,
    pub estatus: Option<String>,
    pub capacidad: Option<i32>,
    pub espacio_superior_id: Option<String>,
}

impl NuevoEspacio {
    pub fn new(tipo: impl Into<String>, nombre: impl Into<String>) -> Self {
        Self {
            tipo: tipo.into(),
            nombre: nombre.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_departamento(mut self, departamento_id: impl Into<String>) -> Self {
        self.departamento_id = Some(departamento_id.into());
        self
    }

    pub fn with_estatus(mut self, estatus: impl Into<String>) -> Self {
        self.estatus = Some(estatus.into());
        self
    }

    pub fn with_capacidad(mut self, capacidad: i32) -> Self {
        self.capacidad = Some(capacidad);
        self
    }

    pub fn with_superior(mut self, espacio_superior_id: impl Into<String>) -> Self {
        self.espacio_superior_id = Some(espacio_superior_id.into());
        self
    }
}

/// Partial update. For nullable columns, `None` leaves the column alone
/// and `Some(None)` clears it. In JSON an absent key is `None` and an
/// explicit `null` is `Some(None)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EspacioUpdate {
    pub tipo: Option<String>,
    pub nombre: Option<String>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub departamento_id: Option<Option<String>>,
    pub estatus: Option<String>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub capacidad: Option<Option<i32>>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub espacio_superior_id: Option<Option<String>>,
}

impl EspacioUpdate {
    pub fn is_empty(&self) -> bool {
        self.tipo.is_none()
            && self.nombre.is_none()
            && self.departamento_id.is_none()
            && self.estatus.is_none()
            && self.capacidad.is_none()
            && self.espacio_superior_id.is_none()
    }
}

fn validate_nombre(nombre: &str) -> Result<()> {
    validate_non_empty_string("nombre", nombre)?;
    validate_max_length("nombre", nombre, NOMBRE_MAX_LEN)
}

fn validate_optional_id(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => validate_identifier(field, v),
        None => Ok(()),
    }
}

fn validate_capacidad(capacidad: Option<i32>) -> Result<()> {
    match capacidad {
        Some(c) => validate_min("capacidad", c, 0),
        None => Ok(()),
    }
}

impl Espacio {
    /// Builds a validated record. A missing id becomes a fresh UUIDv4 and
    /// `ahora` becomes `fecha_registro`.
    pub fn create(nuevo: NuevoEspacio, ahora: DateTime<Utc>) -> Result<Espacio> {
        let tipo: TipoEspacio = nuevo.tipo.parse()?;
        let estatus = match nuevo.estatus.as_deref() {
            Some(s) => s.parse()?,
            None => Estatus::default(),
        };
        validate_nombre(&nuevo.nombre)?;
        validate_optional_id("id", nuevo.id.as_deref())?;
        validate_optional_id("departamento_id", nuevo.departamento_id.as_deref())?;
        validate_optional_id("espacio_superior_id", nuevo.espacio_superior_id.as_deref())?;
        validate_capacidad(nuevo.capacidad)?;

        Ok(Espacio {
            id: nuevo.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            tipo,
            nombre: nuevo.nombre,
            departamento_id: nuevo.departamento_id,
            estatus,
            fecha_registro: ahora,
            fecha_actualizacion: None,
            capacidad: nuevo.capacidad,
            espacio_superior_id: nuevo.espacio_superior_id,
        })
    }

    pub fn create_now(nuevo: NuevoEspacio) -> Result<Espacio> {
        Self::create(nuevo, Utc::now())
    }

    /// Applies `cambios` atomically: either every field validates and the
    /// changes land, or the record is left as it was.
    ///
    /// Returns `true` when some column actually changed, in which case
    /// `fecha_actualizacion` is refreshed. The timestamp never moves
    /// backwards and never precedes `fecha_registro`.
    pub fn apply_update(&mut self, cambios: EspacioUpdate, ahora: DateTime<Utc>) -> Result<bool> {
        let tipo = cambios
            .tipo
            .as_deref()
            .map(str::parse::<TipoEspacio>)
            .transpose()?;
        let estatus = cambios
            .estatus
            .as_deref()
            .map(str::parse::<Estatus>)
            .transpose()?;
        if let Some(nombre) = cambios.nombre.as_deref() {
            validate_nombre(nombre)?;
        }
        if let Some(departamento_id) = &cambios.departamento_id {
            validate_optional_id("departamento_id", departamento_id.as_deref())?;
        }
        if let Some(superior) = &cambios.espacio_superior_id {
            validate_optional_id("espacio_superior_id", superior.as_deref())?;
        }
        if let Some(capacidad) = cambios.capacidad {
            validate_capacidad(capacidad)?;
        }

        let before = self.clone();
        if let Some(tipo) = tipo {
            self.tipo = tipo;
        }
        if let Some(nombre) = cambios.nombre {
            self.nombre = nombre;
        }
        if let Some(departamento_id) = cambios.departamento_id {
            self.departamento_id = departamento_id;
        }
        if let Some(estatus) = estatus {
            self.estatus = estatus;
        }
        if let Some(capacidad) = cambios.capacidad {
            self.capacidad = capacidad;
        }
        if let Some(superior) = cambios.espacio_superior_id {
            self.espacio_superior_id = superior;
        }

        if *self == before {
            return Ok(false);
        }
        self.touch(ahora);
        Ok(true)
    }

    fn touch(&mut self, ahora: DateTime<Utc>) {
        let floor = self
            .fecha_actualizacion
            .map_or(self.fecha_registro, |prev| prev.max(self.fecha_registro));
        self.fecha_actualizacion = Some(ahora.max(floor));
    }

    pub fn is_active(&self) -> bool {
        self.estatus == Estatus::Activo
    }

    /// Re-checks the column constraints on a row that did not come through
    /// [`Espacio::create`], e.g. one read back from a snapshot.
    pub fn validate(&self) -> Result<()> {
        validate_identifier("id", &self.id)?;
        validate_nombre(&self.nombre)?;
        validate_optional_id("departamento_id", self.departamento_id.as_deref())?;
        validate_optional_id("espacio_superior_id", self.espacio_superior_id.as_deref())?;
        validate_capacidad(self.capacidad)?;
        if let Some(fecha) = self.fecha_actualizacion {
            if fecha < self.fecha_registro {
                return Err(EspacioError::validation(
                    "fecha_actualizacion",
                    fecha.to_rfc3339(),
                    "Cannot precede fecha_registro",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departamento {
    pub id: String,
    pub nombre: String,
}

impl Departamento {
    pub fn new(id: impl Into<String>, nombre: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let nombre = nombre.into();
        validate_identifier("departamento.id", &id)?;
        validate_non_empty_string("departamento.nombre", &nombre)?;
        Ok(Self { id, nombre })
    }
}

/// Row of the join table between medical services and spaces.
/// `espacio_id` is nulled when the space is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicioMedicoEspacio {
    pub id: String,
    pub servicio_medico_id: String,
    pub espacio_id: Option<String>,
    pub fecha_registro: DateTime<Utc>,
}

impl ServicioMedicoEspacio {
    pub fn new(
        servicio_medico_id: impl Into<String>,
        espacio_id: impl Into<String>,
        ahora: DateTime<Utc>,
    ) -> Result<Self> {
        let servicio_medico_id = servicio_medico_id.into();
        let espacio_id = espacio_id.into();
        validate_identifier("servicio_medico_id", &servicio_medico_id)?;
        validate_identifier("espacio_id", &espacio_id)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            servicio_medico_id,
            espacio_id: Some(espacio_id),
            fecha_registro: ahora,
        })
    }
}
