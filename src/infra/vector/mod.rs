pub mod pinecone_index;
