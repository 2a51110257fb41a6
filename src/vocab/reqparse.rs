use super::marker::{Expr, Op, Value};
use super::requirement::{Pep508Requirement, VersionOrUrl};
use crate::prelude::*;

// PEP 508, more or less as written:
//
//   https://peps.python.org/pep-0508/#grammar
//
// Differences: URLs are "anything up to whitespace or ';'" (which is what the
// 'packaging' library does too, rather than carrying around a copy of RFC 3986),
// and the legacy dotted marker variables (os.name etc.) are accepted and
// normalized to their modern spelling.
peg::parser! {
    grammar reqparse() for str {
        rule wsp()
            = quiet!{[' ' | '\t']}

        rule ws()
            = wsp()*

        rule letter_or_digit()
            = ['A'..='Z' | 'a'..='z' | '0'..='9']

        rule ident_char()
            = ['A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '.']

        rule identifier() -> &'input str
            = $(letter_or_digit() (letter_or_digit() / ['-' | '_' | '.'])*)

        rule name() -> PackageName
            = n:identifier() {? PackageName::try_from(n).map_err(|_| "valid package name") }

        rule extra() -> Extra
            = e:identifier() {? Extra::try_from(e).map_err(|_| "valid extra name") }

        rule extras() -> BTreeSet<Extra>
            = "[" ws() es:(extra() ** (ws() "," ws())) ws() "]"
              { es.into_iter().collect() }

        rule compare_op() -> CompareOp
            = op:$("===" / "==" / "!=" / "<=" / ">=" / "~=" / "<" / ">")
              {? CompareOp::try_from(op).map_err(|_| "comparison operator") }

        rule version_chars() -> &'input str
            = quiet!{$(['A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '*' | '+' | '!']+)}
              / expected!("version")

        rule version_one() -> Specifier
            = op:compare_op() ws() v:version_chars()
              {? Specifier::new(op, v).map_err(|_| "valid version for operator") }

        rule version_many() -> Vec<Specifier>
            = version_one() ++ (ws() "," ws())

        rule versionspec_inner() -> Specifiers
            = "(" ws() v:version_many() ws() ")" { Specifiers::new(v) }
              / v:version_many() { Specifiers::new(v) }

        pub rule versionspec() -> Specifiers
            = ws() v:versionspec_inner() ws() { v }

        rule url() -> &'input str
            = quiet!{$([^ ' ' | '\t' | ';']+)} / expected!("URL")

        rule url_spec() -> String
            = "@" ws() u:url() { u.to_owned() }

        rule quoted_str() -> String
            = "'" s:$([^ '\'']*) "'" { s.to_owned() }
              / "\"" s:$([^ '"']*) "\"" { s.to_owned() }

        rule env_var() -> String
            = v:$("python_full_version" / "python_version" / "os_name" / "sys_platform"
                  / "platform_release" / "platform_system" / "platform_version"
                  / "platform_machine" / "platform_python_implementation"
                  / "implementation_name" / "implementation_version" / "extra")
              !ident_char() { v.to_owned() }
              / v:$("os.name" / "sys.platform" / "platform.version" / "platform.machine"
                    / "platform.python_implementation" / "python_implementation")
              !ident_char() { legacy_marker_var(v).to_owned() }

        rule marker_value() -> Value
            = v:env_var() { Value::Variable(v) }
              / s:quoted_str() { Value::Literal(s) }
              / expected!("marker variable or quoted string")

        rule marker_op() -> Op
            = "in" !ident_char() { Op::In }
              / "not" wsp()+ "in" !ident_char() { Op::NotIn }
              / op:compare_op() { Op::Compare(op) }

        rule marker_atom() -> Expr
            = "(" ws() e:marker_or() ws() ")" { e }
              / lhs:marker_value() ws() op:marker_op() ws() rhs:marker_value()
                { Expr::Operator { op, lhs, rhs } }

        rule marker_and() -> Expr
            = first:marker_atom() rest:(ws() "and" !ident_char() ws() e:marker_atom() { e })*
              {
                  rest.into_iter()
                      .fold(first, |acc, e| Expr::And(Box::new(acc), Box::new(e)))
              }

        rule marker_or() -> Expr
            = first:marker_and() rest:(ws() "or" !ident_char() ws() e:marker_and() { e })*
              {
                  rest.into_iter()
                      .fold(first, |acc, e| Expr::Or(Box::new(acc), Box::new(e)))
              }

        pub rule marker() -> Expr
            = ws() m:marker_or() ws() { m }

        rule marker_clause() -> Marker
            = ";" ws() m:marker_or() { Marker(m) }

        rule version_or_url() -> VersionOrUrl
            = u:url_spec() { VersionOrUrl::Url(u) }
              / v:versionspec_inner() { VersionOrUrl::Version(v) }

        pub rule requirement() -> Pep508Requirement
            = ws() name:name() ws() extras:extras()? ws() version_or_url:version_or_url()?
              ws() marker:marker_clause()? ws()
              {
                  Pep508Requirement {
                      name,
                      extras: extras.unwrap_or_default(),
                      version_or_url: version_or_url
                          .unwrap_or(VersionOrUrl::Version(Specifiers::any())),
                      marker,
                  }
              }
    }
}

fn legacy_marker_var(var: &str) -> &'static str {
    match var {
        "os.name" => "os_name",
        "sys.platform" => "sys_platform",
        "platform.version" => "platform_version",
        "platform.machine" => "platform_machine",
        _ => "platform_python_implementation",
    }
}

pub fn versionspec(input: &str) -> Result<Specifiers> {
    Ok(reqparse::versionspec(input)?)
}

pub fn marker(input: &str) -> Result<Expr> {
    Ok(reqparse::marker(input)?)
}

pub fn requirement(input: &str) -> Result<Pep508Requirement> {
    Ok(reqparse::requirement(input)?)
}
