//! Boundary detection for `pg_dump --format=plain` output
//!
//! pg_dump writes a comment header before every archive entry:
//!
//! ```text
//! --
//! -- Name: users; Type: TABLE; Schema: public; Owner: postgres
//! --
//! ```
//!
//! One table is spread over several entries (structure, data, defaults,
//! constraints, triggers) separated by entries of other objects, so a table
//! may own several blocks.

use std::sync::OnceLock;

use regex::bytes::Regex;

use super::{BoundaryDetector, Marker};

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?m)^-- (?:Data for )?Name: ([^;\r\n]*); ",
            r"Type: ([^;\r\n]*); Schema: ([^;\r\n]*);",
        ))
        .expect("static pattern")
    })
}

// Statements emitted by --clean ahead of the first entry header.
fn clean_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^(?:DROP |ALTER TABLE (?:ONLY |IF EXISTS )*[^\r\n]* DROP CONSTRAINT )")
            .expect("static pattern")
    })
}

/// Markers for pg_dump's archive entry headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PgDumpMarkers;

impl PgDumpMarkers {
    fn owner(name: &str, kind: &str, schema: &str) -> Option<String> {
        let table = match kind {
            "TABLE" | "TABLE DATA" => name,
            "CONSTRAINT" | "FK CONSTRAINT" | "DEFAULT" | "TRIGGER" => name.split(' ').next()?,
            _ => return None,
        };
        if table.is_empty() {
            return None;
        }
        Some(match schema {
            "" | "-" => table.to_string(),
            schema => format!("{schema}.{table}"),
        })
    }
}

impl BoundaryDetector for PgDumpMarkers {
    fn name(&self) -> &'static str {
        "pg_dump"
    }

    fn markers(&self, dump: &[u8]) -> Vec<Marker> {
        let headers = header_pattern().captures_iter(dump).filter_map(|caps| {
            let offset = caps.get(0)?.start();
            let field = |i| {
                let bytes = caps.get(i).map_or(&b""[..], |m| m.as_bytes());
                String::from_utf8_lossy(bytes).into_owned()
            };
            let (name, kind, schema) = (field(1), field(2), field(3));
            Some(match Self::owner(name.trim(), kind.trim(), schema.trim()) {
                Some(table) => Marker::table(offset, table),
                None => Marker::boundary(offset),
            })
        });
        let cleans = clean_pattern()
            .find_iter(dump)
            .map(|m| Marker::boundary(m.start()));

        let mut markers: Vec<Marker> = headers.chain(cleans).collect();
        markers.sort_by_key(|m| m.offset);
        markers
    }

    /// `public.users` is requested as either `public.users` or `users`
    fn matches(&self, block_table: &str, requested: &str) -> bool {
        block_table == requested
            || block_table
                .split_once('.')
                .is_some_and(|(_, bare)| bare == requested)
    }

    fn multi_block(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract, split_blocks};

    const DUMP: &str = "\
--
-- PostgreSQL database dump
--

SET statement_timeout = 0;
SET client_encoding = 'UTF8';

ALTER TABLE ONLY public.orders DROP CONSTRAINT orders_user_id_fkey;
DROP TABLE public.users;
DROP TABLE public.orders;
--
-- Name: users; Type: TABLE; Schema: public; Owner: postgres
--

CREATE TABLE public.users (
    id integer NOT NULL,
    name text
);

--
-- Name: orders; Type: TABLE; Schema: public; Owner: postgres
--

CREATE TABLE public.orders (
    id integer NOT NULL,
    user_id integer
);

--
-- Name: users_id_seq; Type: SEQUENCE; Schema: public; Owner: postgres
--

CREATE SEQUENCE public.users_id_seq;

--
-- Data for Name: users; Type: TABLE DATA; Schema: public; Owner: postgres
--

COPY public.users (id, name) FROM stdin;
1\tada
\\.

--
-- Data for Name: orders; Type: TABLE DATA; Schema: public; Owner: postgres
--

COPY public.orders (id, user_id) FROM stdin;
7\t1
\\.

--
-- Name: users users_pkey; Type: CONSTRAINT; Schema: public; Owner: postgres
--

ALTER TABLE ONLY public.users
    ADD CONSTRAINT users_pkey PRIMARY KEY (id);

--
-- Name: orders orders_user_id_fkey; Type: FK CONSTRAINT; Schema: public; Owner: postgres
--

ALTER TABLE ONLY public.orders
    ADD CONSTRAINT orders_user_id_fkey FOREIGN KEY (user_id) REFERENCES public.users(id);

--
-- PostgreSQL database dump complete
--
";

    fn text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_owner_by_entry_type() {
        let owner = |name, kind, schema| PgDumpMarkers::owner(name, kind, schema);
        assert_eq!(owner("users", "TABLE", "public"), Some("public.users".to_string()));
        assert_eq!(
            owner("users users_pkey", "CONSTRAINT", "public"),
            Some("public.users".to_string())
        );
        assert_eq!(owner("users id", "DEFAULT", "app"), Some("app.users".to_string()));
        assert_eq!(PgDumpMarkers::owner("users_id_seq", "SEQUENCE", "public"), None);
        assert_eq!(PgDumpMarkers::owner("shop", "DATABASE", "-"), None);
    }

    #[test]
    fn test_clean_statements_leave_preamble() {
        let blocks = split_blocks(DUMP.as_bytes(), &PgDumpMarkers);
        let preamble = &DUMP[..blocks[0].range.start];
        assert!(preamble.ends_with("SET client_encoding = 'UTF8';\n\n"));
        assert!(!preamble.contains("DROP"));
        assert_eq!(blocks[0].table, None);
    }

    #[test]
    fn test_collects_every_entry_of_a_table() {
        let extraction = extract(DUMP.as_bytes(), &["users"], &PgDumpMarkers);
        let out = text(&extraction.filtered);
        assert!(out.contains("CREATE TABLE public.users ("));
        assert!(out.contains("COPY public.users (id, name) FROM stdin;\n1\tada\n\\.\n"));
        assert!(out.contains("ADD CONSTRAINT users_pkey PRIMARY KEY (id);"));
        assert!(!out.contains("public.orders"));
        assert!(!out.contains("users_id_seq"));
        assert!(!out.contains("DROP TABLE"));
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_qualified_and_bare_names() {
        let bare = extract(DUMP.as_bytes(), &["orders"], &PgDumpMarkers);
        let qualified = extract(DUMP.as_bytes(), &["public.orders"], &PgDumpMarkers);
        assert_eq!(bare.filtered, qualified.filtered);
        assert!(text(&bare.filtered).contains("REFERENCES public.users(id)"));

        let other_schema = extract(DUMP.as_bytes(), &["audit.orders"], &PgDumpMarkers);
        assert_eq!(other_schema.warnings, vec!["table audit.orders not found in dump".to_string()]);
    }

    #[test]
    fn test_request_order_over_dump_order() {
        let extraction = extract(DUMP.as_bytes(), &["orders", "users"], &PgDumpMarkers);
        let out = text(&extraction.filtered);
        let orders = out.find("CREATE TABLE public.orders").unwrap();
        let users = out.find("CREATE TABLE public.users").unwrap();
        assert!(orders < users);
    }
}
