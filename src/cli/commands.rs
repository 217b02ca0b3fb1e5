use crate::cli::{AddArgs, ApplyArgs, ChainArgs, DeleteArgs, ListArgs, SearchArgs, ShowArgs};
use crate::core::catalog::NewTransformation;
use crate::core::service::MorphoService;
use std::io::Write;
use std::path::Path;

pub async fn list(service: &MorphoService, args: ListArgs) -> anyhow::Result<()> {
    let entries = service.list().await;
    if args.json {
        let views: Vec<_> = entries.iter().map(|e| e.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    for entry in entries {
        let description = entry.description.as_deref().unwrap_or("-");
        println!("{:>4}  {:<32}  {}", entry.id, entry.name, description);
    }
    Ok(())
}

pub async fn show(service: &MorphoService, args: ShowArgs) -> anyhow::Result<()> {
    let entry = service.get(&args.selector).await?;
    println!("{}", serde_json::to_string_pretty(entry.as_ref())?);
    Ok(())
}

pub async fn add(service: &MorphoService, args: AddArgs) -> anyhow::Result<()> {
    let entry = service
        .add(NewTransformation {
            name: args.name,
            program: args.program,
            inputs: args.inputs,
            outputs: args.outputs,
            description: args.description,
        })
        .await?;
    println!("added '{}' with id {}", entry.name, entry.id);
    Ok(())
}

pub async fn delete(service: &MorphoService, args: DeleteArgs) -> anyhow::Result<()> {
    service.delete(&args.selector).await?;
    println!("deleted '{}'", args.selector);
    Ok(())
}

pub async fn apply(service: &MorphoService, args: ApplyArgs) -> anyhow::Result<()> {
    let bytes = service.apply(&args.selector, &args.input).await?;
    emit(args.out.as_deref(), &bytes)
}

pub async fn chain(service: &MorphoService, args: ChainArgs) -> anyhow::Result<()> {
    let bytes = service.apply_chain(&args.names, &args.input).await?;
    emit(args.out.as_deref(), &bytes)
}

pub async fn search(service: &MorphoService, args: SearchArgs) -> anyhow::Result<()> {
    let matches = service.search(&args.query).await?;
    if matches.is_empty() {
        println!("no matches for '{}'", args.query);
        return Ok(());
    }
    for hit in matches {
        println!("{:<32}  {}", hit.name, hit.context);
    }
    Ok(())
}

fn emit(out: Option<&Path>, bytes: &[u8]) -> anyhow::Result<()> {
    match out {
        Some(path) => std::fs::write(path, bytes)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
