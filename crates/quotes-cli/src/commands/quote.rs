//! Quote command handlers

use anyhow::{bail, Result};

use quotes_core::categories::category_counts;
use quotes_core::render::{empty_list_message, EMPTY_MESSAGE};
use quotes_core::{CategoryFilter, Library};

use crate::output::Output;
use crate::prompt::confirm;

/// Show a random quote
pub fn random(library: &mut Library, category: Option<String>, output: &Output) -> Result<()> {
    let filter = category.as_deref().map(CategoryFilter::parse);
    match library.random(filter.as_ref(), &mut rand::thread_rng()) {
        Some(view) => output.print_quote(&view),
        None => output.message(EMPTY_MESSAGE),
    }
    Ok(())
}

/// Add a quote
pub fn add(library: &mut Library, text: String, category: String, output: &Output) -> Result<()> {
    let quote = library.add(&text, &category)?;
    output.success(&format!("Added quote to \"{}\"", quote.category));
    Ok(())
}

/// List quotes, applying and saving `category` as the filter if given
pub fn list(library: &mut Library, category: Option<String>, output: &Output) -> Result<()> {
    let (views, filter) = match category {
        Some(category) => {
            let filter = CategoryFilter::parse(&category);
            (library.apply_filter(filter.clone()), filter)
        }
        None => (library.list(None), library.selected_filter().clone()),
    };

    output.print_quotes(&views, &empty_list_message(&filter));
    Ok(())
}

/// Delete the quote at a 1-based position in the full list
pub fn delete(library: &mut Library, position: usize, yes: bool, output: &Output) -> Result<()> {
    let len = library.quotes().len();
    let Some(quote) = position
        .checked_sub(1)
        .and_then(|index| library.quotes().get(index))
        .cloned()
    else {
        bail!("No quote at position {} (there are {} quotes)", position, len);
    };

    if output.should_prompt() && !yes {
        println!("Delete quote: {}", quote);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library.delete(position - 1)?;
    output.success(&format!("Deleted quote {}", position));
    Ok(())
}

/// List categories with quote counts
pub fn categories(library: &Library, output: &Output) -> Result<()> {
    let counts = category_counts(library.quotes().all());
    output.print_categories(&counts, library.quotes().len(), library.selected_filter());
    Ok(())
}

/// Select a category filter, or clear the saved one
pub fn filter(
    library: &mut Library,
    category: Option<String>,
    clear: bool,
    output: &Output,
) -> Result<()> {
    if clear {
        library.clear_filter();
        output.success("Filter cleared, showing all quotes");
        return Ok(());
    }

    let Some(category) = category else {
        output.message(&format!("Current filter: {}", library.selected_filter()));
        return Ok(());
    };

    let filter = CategoryFilter::parse(&category);
    if !library.category_index().contains(&filter) {
        bail!(
            "Unknown category: \"{}\"\nAvailable: {}",
            category,
            library.category_index().options().join(", ")
        );
    }

    let views = library.apply_filter(filter.clone());
    output.success(&format!("Filter set to {}", filter));
    output.print_quotes(&views, &empty_list_message(&filter));
    Ok(())
}

/// Remove every quote
pub fn clear(library: &mut Library, yes: bool, output: &Output) -> Result<()> {
    if output.should_prompt() && !yes {
        println!("Delete all {} quotes.", library.quotes().len());
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library.clear();
    output.success("All quotes cleared");
    Ok(())
}

/// Replace every quote with the built-in set
pub fn reset(library: &mut Library, yes: bool, output: &Output) -> Result<()> {
    if output.should_prompt() && !yes {
        println!("Replace all quotes with the defaults.");
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library.reset_to_default();
    output.success(&format!(
        "Restored {} default quotes",
        library.quotes().len()
    ));
    Ok(())
}
