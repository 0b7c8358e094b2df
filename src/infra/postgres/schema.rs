use crate::domain::{
    collection::{CollectionDefinition, FieldDefinition, FieldKind},
    error::AuditError,
    id::Identifier,
};

fn column_type(field: &FieldDefinition) -> &'static str {
    match field.kind {
        FieldKind::Text | FieldKind::Select => "TEXT",
        FieldKind::Number => "DOUBLE PRECISION",
        FieldKind::Bool => "BOOLEAN",
        FieldKind::Json => "JSONB",
        FieldKind::Date | FieldKind::Autodate => "TIMESTAMPTZ",
    }
}

fn sql_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn column_ddl(field: &FieldDefinition) -> Result<String, AuditError> {
    let name = Identifier::new(field.name.as_str())?;
    let mut ddl = format!("{} {}", name.quoted(), column_type(field));
    if field.required {
        ddl.push_str(" NOT NULL");
    }
    if field.kind == FieldKind::Select && !field.values.is_empty() {
        let allowed: Vec<String> = field.values.iter().map(|v| sql_literal(v)).collect();
        ddl.push_str(&format!(" CHECK ({} IN ({}))", name.quoted(), allowed.join(", ")));
    }
    Ok(ddl)
}

/// `CREATE TABLE` followed by one `CREATE INDEX` per declared index.
/// Every name is checked as an identifier before it reaches the SQL text.
pub fn table_ddl(definition: &CollectionDefinition) -> Result<Vec<String>, AuditError> {
    let table = Identifier::new(definition.name.as_str())?;

    let mut columns = vec!["\"id\" TEXT PRIMARY KEY".to_string()];
    for field in &definition.fields {
        if field.name == "id" {
            return Err(AuditError::Validation(format!(
                "{}: `id` is reserved",
                definition.name
            )));
        }
        columns.push(column_ddl(field)?);
    }

    let mut statements = vec![format!(
        "CREATE TABLE {} (\n    {}\n)",
        table.quoted(),
        columns.join(",\n    ")
    )];

    for index in &definition.indexes {
        let name = Identifier::new(index.name.as_str())?;
        let columns = index
            .columns
            .iter()
            .map(|c| Identifier::new(c.as_str()).map(|c| c.quoted()))
            .collect::<Result<Vec<_>, _>>()?;
        statements.push(format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            name.quoted(),
            table.quoted(),
            columns.join(", ")
        ));
    }

    Ok(statements)
}

/// Upsert of one row given as a JSON object in `$1`. Create-only autodate
/// columns keep their original value on conflict.
pub fn upsert_sql(definition: &CollectionDefinition) -> Result<String, AuditError> {
    let table = Identifier::new(definition.name.as_str())?.quoted();

    let updates = definition
        .fields
        .iter()
        .filter(|f| !(f.kind == FieldKind::Autodate && !f.on_update))
        .map(|f| {
            Identifier::new(f.name.as_str()).map(|c| {
                let c = c.quoted();
                format!("{c} = EXCLUDED.{c}")
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let on_conflict = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    Ok(format!(
        "INSERT INTO {table} SELECT * FROM jsonb_populate_record(NULL::{table}, $1) \
         ON CONFLICT (\"id\") {on_conflict}"
    ))
}
