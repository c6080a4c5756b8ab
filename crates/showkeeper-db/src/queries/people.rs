//! Person queries.
//!
//! People are deduplicated by name and linked to media entities with an
//! optional role.

use rusqlite::{params, Connection};
use showkeeper_common::{Error, MediaKind, PersonId, Result};

use super::id_column;
use crate::models::Person;

/// Get a person by name.
pub fn get_person_by_name(conn: &Connection, name: &str) -> Result<Option<Person>> {
    let result = conn.query_row(
        "SELECT id, name FROM people WHERE name = ?",
        [name],
        |row| {
            Ok(Person {
                id: id_column(row, 0)?,
                name: row.get(1)?,
            })
        },
    );

    match result {
        Ok(person) => Ok(Some(person)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Link a person to a media entity, creating the person on first encounter.
pub fn link_person(
    conn: &Connection,
    name: &str,
    role: Option<&str>,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<Person> {
    conn.execute(
        "INSERT OR IGNORE INTO people (id, name) VALUES (?, ?)",
        params![PersonId::new().to_string(), name],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let person = get_person_by_name(conn, name)?
        .ok_or_else(|| Error::internal(format!("person {} vanished after insert", name)))?;

    conn.execute(
        "INSERT OR IGNORE INTO person_links (person_id, media_kind, media_id, role)
         VALUES (?, ?, ?, ?)",
        params![person.id.to_string(), media_kind.to_string(), media_id, role],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(person)
}

/// List the people linked to a media entity, by name.
pub fn list_people_for_media(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<Vec<Person>> {
    let mut stmt = conn
        .prepare(
            "SELECT p.id, p.name FROM people p
             JOIN person_links l ON l.person_id = p.id
             WHERE l.media_kind = ? AND l.media_id = ?
             ORDER BY p.name",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let people = stmt
        .query_map(params![media_kind.to_string(), media_id], |row| {
            Ok(Person {
                id: id_column(row, 0)?,
                name: row.get(1)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(people)
}

/// Remove every person link of a media entity. People themselves are kept.
pub fn delete_all_person_links(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM person_links WHERE media_kind = ? AND media_id = ?",
        params![media_kind.to_string(), media_id],
    )
    .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{create_test_show, setup_test_db};

    #[test]
    fn test_link_person_deduplicates_by_name() {
        let conn = setup_test_db();
        let (_, show) = create_test_show(&conn);
        let media_id = show.id.to_string();

        let a = link_person(&conn, "Dominique Tipper", Some("Naomi"), MediaKind::TvShow, &media_id)
            .unwrap();
        let b = link_person(&conn, "Dominique Tipper", None, MediaKind::TvShow, "other").unwrap();
        assert_eq!(a.id, b.id);

        link_person(&conn, "Steven Strait", Some("Holden"), MediaKind::TvShow, &media_id).unwrap();
        let names: Vec<_> = list_people_for_media(&conn, MediaKind::TvShow, &media_id)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Dominique Tipper", "Steven Strait"]);
    }

    #[test]
    fn test_delete_all_person_links() {
        let conn = setup_test_db();
        let (_, show) = create_test_show(&conn);
        let media_id = show.id.to_string();
        link_person(&conn, "Wes Chatham", None, MediaKind::TvShow, &media_id).unwrap();

        assert_eq!(delete_all_person_links(&conn, MediaKind::TvShow, &media_id).unwrap(), 1);
        assert!(list_people_for_media(&conn, MediaKind::TvShow, &media_id)
            .unwrap()
            .is_empty());
        assert!(get_person_by_name(&conn, "Wes Chatham").unwrap().is_some());
    }
}
