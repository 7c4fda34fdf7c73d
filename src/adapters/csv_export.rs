use crate::domain::model::Espacio;
use crate::utils::error::Result;
use std::io::Write;

/// Column order of `tbc_espacios`.
pub const COLUMNS: [&str; 9] = [
    "id",
    "tipo",
    "nombre",
    "departamento_id",
    "estatus",
    "fecha_registro",
    "fecha_actualizacion",
    "capacidad",
    "espacio_superior_id",
];

/// One row per space. Null columns are written as empty cells.
pub fn write_espacios<W: Write>(writer: W, espacios: &[Espacio]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(COLUMNS)?;

    for espacio in espacios {
        csv_writer.write_record([
            espacio.id.clone(),
            espacio.tipo.to_string(),
            espacio.nombre.clone(),
            espacio.departamento_id.clone().unwrap_or_default(),
            espacio.estatus.to_string(),
            espacio.fecha_registro.to_rfc3339(),
            espacio
                .fecha_actualizacion
                .map(|f| f.to_rfc3339())
                .unwrap_or_default(),
            espacio
                .capacidad
                .map(|c| c.to_string())
                .unwrap_or_default(),
            espacio.espacio_superior_id.clone().unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn espacios_to_csv(espacios: &[Espacio]) -> Result<String> {
    let mut buffer = Vec::new();
    write_espacios(&mut buffer, espacios)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
