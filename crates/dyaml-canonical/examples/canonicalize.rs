use dyaml_canonical::canonicalize_text;

fn main() {
    let document = "\
# Service limits
service:
  name: ingest
  replicas: 03
  # Max 50 due to memory constraints
  workers: 50
  enabled: yes
  tags: [edge, ingest]
";

    match canonicalize_text(document) {
        Ok(result) => {
            print!("{}", result.text);
            eprintln!("digest: {}", result.tree.digest());
        }
        Err(err) => {
            eprintln!("canonicalization failed: {}", err);
            std::process::exit(1);
        }
    }
}
